//! Taggable model fixtures
//!
//! - `Post`: plain taggable model with an `i64` key
//! - `Dummy`: soft-deleting model with an `Option<i64>` key
//! - `Widget`: model using the custom `ColoredTag` record

use reinhardt_taggable::backend::TagDatabase;
use reinhardt_taggable::models::TagModel;
use reinhardt_taggable::{TagSet, taggable};
use sea_query::{Alias, Query, SqliteQueryBuilder};
use sqlx::Row;
use sqlx::any::AnyRow;

#[taggable(content_type = "Post", table = "posts")]
#[derive(Debug, Clone)]
pub struct Post {
	pub id: i64,
	pub title: String,
	pub tags: TagSet,
}

#[taggable(content_type = "Dummy", table = "dummies", soft_deletes)]
#[derive(Debug, Clone)]
pub struct Dummy {
	pub id: Option<i64>,
	pub title: String,
	pub tags: TagSet,
}

/// Tag record reading the extra `color` column
#[derive(Debug, Clone, PartialEq)]
pub struct ColoredTag {
	pub tag_id: i64,
	pub name: String,
	pub normalized: String,
	pub color: Option<String>,
}

impl TagModel for ColoredTag {
	fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
		Ok(Self {
			tag_id: row.try_get("tag_id")?,
			name: row.try_get("name")?,
			normalized: row.try_get("normalized")?,
			color: row.try_get("color")?,
		})
	}

	fn tag_id(&self) -> i64 {
		self.tag_id
	}

	fn name(&self) -> &str {
		&self.name
	}

	fn normalized(&self) -> &str {
		&self.normalized
	}
}

#[taggable(content_type = "Widget", table = "widgets", tag_model = ColoredTag, tags = "labels")]
#[derive(Debug, Clone)]
pub struct Widget {
	pub id: i64,
	pub title: String,
	pub labels: TagSet<ColoredTag>,
}

/// Insert a row into `table` and return its key
pub async fn insert_row(db: &TagDatabase, table: &str, title: &str) -> i64 {
	let stmt = Query::insert()
		.into_table(Alias::new(table))
		.columns([Alias::new("title")])
		.values_panic([title.into()])
		.returning_col(Alias::new("id"))
		.to_owned();
	let row = sqlx::query(&stmt.to_string(SqliteQueryBuilder))
		.fetch_one(db.pool())
		.await
		.expect("Failed to insert model row");
	row.try_get::<i64, _>(0).expect("No key for inserted row")
}

pub async fn create_post(db: &TagDatabase, title: &str) -> Post {
	Post {
		id: insert_row(db, "posts", title).await,
		title: title.to_string(),
		tags: TagSet::new(),
	}
}

pub async fn create_dummy(db: &TagDatabase, title: &str) -> Dummy {
	Dummy {
		id: Some(insert_row(db, "dummies", title).await),
		title: title.to_string(),
		tags: TagSet::new(),
	}
}

pub async fn create_widget(db: &TagDatabase, title: &str) -> Widget {
	Widget {
		id: insert_row(db, "widgets", title).await,
		title: title.to_string(),
		labels: TagSet::new(),
	}
}

/// Unsaved dummy, without a key
pub fn unsaved_dummy() -> Dummy {
	Dummy {
		id: None,
		title: "unsaved".to_string(),
		tags: TagSet::new(),
	}
}
