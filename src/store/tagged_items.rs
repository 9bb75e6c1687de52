//! Association store
//!
//! Rows of the polymorphic association table. Attach and detach are
//! idempotent, so retrying either is safe.

use super::ident;
use crate::backend::TagDatabase;
use crate::config::TagConfig;
use crate::error::Result;
use crate::models::TaggedItem;
use crate::models::tag::timestamp_now;
use sea_query::{Asterisk, Condition, Expr, ExprTrait, OnConflict, Order, Query};
use sqlx::Row;
use std::sync::Arc;

/// Store for rows of the association table
#[derive(Clone)]
pub struct TaggedItemStore {
	db: TagDatabase,
	config: Arc<TagConfig>,
}

impl TaggedItemStore {
	pub fn new(db: TagDatabase, config: Arc<TagConfig>) -> Self {
		Self { db, config }
	}

	fn table(&self) -> &str {
		&self.config.tables.taggables
	}

	fn item_condition(tag_id: i64, object_id: i64, content_type: &str) -> Condition {
		Condition::all()
			.add(Expr::col(ident("tag_id")).eq(tag_id))
			.add(Expr::col(ident("taggable_id")).eq(object_id))
			.add(Expr::col(ident("taggable_type")).eq(content_type))
	}

	/// Link a tag to an entity
	///
	/// Returns `false` when the association already existed. Without
	/// `ON CONFLICT` the unique index rejects the duplicate instead.
	pub async fn attach(&self, tag_id: i64, object_id: i64, content_type: &str) -> Result<bool> {
		let now = timestamp_now();
		let mut stmt = Query::insert();
		stmt.into_table(ident(self.table()))
			.columns([
				ident("tag_id"),
				ident("taggable_id"),
				ident("taggable_type"),
				ident("created_at"),
				ident("updated_at"),
			])
			.values_panic([
				tag_id.into(),
				object_id.into(),
				content_type.into(),
				now.clone().into(),
				now.into(),
			]);
		if self.db.backend().supports_on_conflict() {
			stmt.on_conflict(OnConflict::new().do_nothing().to_owned());
		}

		let inserted = match self.db.execute(&self.db.build_sql(stmt)).await {
			Ok(rows) => rows > 0,
			Err(err) if err.is_unique_violation() => false,
			Err(err) => return Err(err),
		};
		if inserted {
			tracing::debug!(
				tag_id,
				object_id,
				content_type = %content_type,
				"Attached tag"
			);
		}
		Ok(inserted)
	}

	/// Remove one association
	///
	/// Returns `false` when there was nothing to remove.
	pub async fn detach(&self, tag_id: i64, object_id: i64, content_type: &str) -> Result<bool> {
		let stmt = Query::delete()
			.from_table(ident(self.table()))
			.cond_where(Self::item_condition(tag_id, object_id, content_type))
			.to_owned();

		let removed = self.db.execute(&self.db.build_sql(stmt)).await? > 0;
		if removed {
			tracing::debug!(
				tag_id,
				object_id,
				content_type = %content_type,
				"Detached tag"
			);
		}
		Ok(removed)
	}

	/// Remove every association of one entity in a single statement
	pub async fn detach_all(&self, object_id: i64, content_type: &str) -> Result<u64> {
		let stmt = Query::delete()
			.from_table(ident(self.table()))
			.and_where(Expr::col(ident("taggable_id")).eq(object_id))
			.and_where(Expr::col(ident("taggable_type")).eq(content_type))
			.to_owned();

		let removed = self.db.execute(&self.db.build_sql(stmt)).await?;
		tracing::debug!(
			object_id,
			content_type = %content_type,
			removed,
			"Detached all tags"
		);
		Ok(removed)
	}

	/// Keys of the entities of `content_type` carrying the tag
	pub async fn tagged_object_ids(&self, tag_id: i64, content_type: &str) -> Result<Vec<i64>> {
		let stmt = Query::select()
			.column(ident("taggable_id"))
			.from(ident(self.table()))
			.and_where(Expr::col(ident("tag_id")).eq(tag_id))
			.and_where(Expr::col(ident("taggable_type")).eq(content_type))
			.order_by(ident("taggable_id"), Order::Asc)
			.to_owned();

		let rows = self.db.fetch_all(&self.db.build_sql(stmt)).await?;
		Ok(rows
			.iter()
			.map(|row| row.try_get::<i64, _>("taggable_id"))
			.collect::<std::result::Result<_, _>>()?)
	}

	/// Raw association rows of one entity, in attachment order
	pub async fn items_for_object(
		&self,
		content_type: &str,
		object_id: i64,
	) -> Result<Vec<TaggedItem>> {
		let stmt = Query::select()
			.column(Asterisk)
			.from(ident(self.table()))
			.and_where(Expr::col(ident("taggable_type")).eq(content_type))
			.and_where(Expr::col(ident("taggable_id")).eq(object_id))
			.order_by(ident("id"), Order::Asc)
			.to_owned();

		let rows = self.db.fetch_all(&self.db.build_sql(stmt)).await?;
		Ok(rows
			.iter()
			.map(TaggedItem::from_row)
			.collect::<std::result::Result<_, _>>()?)
	}
}
