//! Tag entity store
//!
//! CRUD and aggregate reads over the tags table. Every read selects the
//! full tag row so custom [`TagModel`] types can pick up extra columns.

use super::{column, ident};
use crate::backend::TagDatabase;
use crate::config::TagConfig;
use crate::error::{Result, TaggableError};
use crate::models::tag::timestamp_now;
use crate::models::{PopularTag, Tag, TagModel};
use sea_query::{
	Asterisk, Expr, ExprTrait, Func, JoinType, OnConflict, Order, Query, SelectStatement,
};
use sqlx::Row;
use std::marker::PhantomData;
use std::sync::Arc;

/// Store for rows of the tags table
pub struct TagStore<M: TagModel = Tag> {
	db: TagDatabase,
	config: Arc<TagConfig>,
	_model: PhantomData<fn() -> M>,
}

impl<M: TagModel> Clone for TagStore<M> {
	fn clone(&self) -> Self {
		Self {
			db: self.db.clone(),
			config: Arc::clone(&self.config),
			_model: PhantomData,
		}
	}
}

impl<M: TagModel> TagStore<M> {
	pub fn new(db: TagDatabase, config: Arc<TagConfig>) -> Self {
		Self {
			db,
			config,
			_model: PhantomData,
		}
	}

	fn tags_table(&self) -> &str {
		&self.config.tables.tags
	}

	fn taggables_table(&self) -> &str {
		&self.config.tables.taggables
	}

	/// `SELECT tags.* FROM tags`
	fn select_tags(&self) -> SelectStatement {
		Query::select()
			.column((ident(self.tags_table()), Asterisk))
			.from(ident(self.tags_table()))
			.to_owned()
	}

	/// `... INNER JOIN taggables ON taggables.tag_id = tags.tag_id`
	fn join_taggables(&self, stmt: &mut SelectStatement) {
		stmt.join(
			JoinType::InnerJoin,
			ident(self.taggables_table()),
			Expr::col(column(self.taggables_table(), "tag_id"))
				.equals(column(self.tags_table(), "tag_id")),
		);
	}

	async fn fetch_models(&self, stmt: SelectStatement) -> Result<Vec<M>> {
		let sql = self.db.build_sql(stmt);
		let rows = self.db.fetch_all(&sql).await?;
		rows.iter()
			.map(|row| M::from_row(row).map_err(TaggableError::from))
			.collect()
	}

	/// Find a tag by its normalized name
	///
	/// When several rows share the name, the one with the lowest id wins.
	pub async fn find_by_normalized(&self, normalized: &str) -> Result<Option<M>> {
		let stmt = self
			.select_tags()
			.and_where(Expr::col(column(self.tags_table(), "normalized")).eq(normalized))
			.order_by(column(self.tags_table(), "tag_id"), Order::Asc)
			.limit(1)
			.to_owned();

		let sql = self.db.build_sql(stmt);
		match self.db.fetch_optional(&sql).await? {
			Some(row) => Ok(Some(M::from_row(&row)?)),
			None => Ok(None),
		}
	}

	/// Find a tag by display name, normalizing it first
	pub async fn find(&self, name: &str) -> Result<Option<M>> {
		let normalized = self.config.normalize(name.trim());
		self.find_by_normalized(&normalized).await
	}

	/// Find the tag for `raw_name`, creating it when missing
	///
	/// A concurrent insert of the same normalized name resolves to the
	/// existing row on backends with `ON CONFLICT` and a unique index on
	/// `normalized`.
	pub async fn find_or_create(&self, raw_name: &str) -> Result<M> {
		let name = raw_name.trim();
		if name.is_empty() {
			return Err(TaggableError::InvalidTagInput(
				"tag name is empty".to_string(),
			));
		}
		let normalized = self.config.normalize(name);

		if let Some(tag) = self.find_by_normalized(&normalized).await? {
			return Ok(tag);
		}

		let now = timestamp_now();
		let mut stmt = Query::insert();
		stmt.into_table(ident(self.tags_table()))
			.columns([
				ident("name"),
				ident("normalized"),
				ident("created_at"),
				ident("updated_at"),
			])
			.values_panic([
				name.into(),
				normalized.clone().into(),
				now.clone().into(),
				now.into(),
			]);
		if self.db.backend().supports_on_conflict() {
			stmt.on_conflict(OnConflict::new().do_nothing().to_owned());
		}

		let inserted = match self.db.execute(&self.db.build_sql(stmt)).await {
			Ok(inserted) => inserted,
			// Lost a race against a concurrent insert of the same name
			Err(err) if err.is_unique_violation() => 0,
			Err(err) => return Err(err),
		};
		if inserted > 0 {
			tracing::debug!(tag = %name, normalized = %normalized, "Created tag");
		}

		self.find_by_normalized(&normalized)
			.await?
			.ok_or_else(|| TaggableError::Database(sqlx::Error::RowNotFound))
	}

	/// Keys of the tags with the given normalized names
	///
	/// One key per name found, the lowest when duplicates exist. Missing
	/// names are skipped.
	pub async fn find_many_keys_by_normalized(&self, normalized: &[String]) -> Result<Vec<i64>> {
		if normalized.is_empty() {
			return Ok(Vec::new());
		}

		let stmt = Query::select()
			.expr_as(
				Func::min(Expr::col(column(self.tags_table(), "tag_id"))),
				ident("tag_id"),
			)
			.from(ident(self.tags_table()))
			.and_where(
				Expr::col(column(self.tags_table(), "normalized"))
					.is_in(normalized.iter().map(String::as_str)),
			)
			.group_by_col(column(self.tags_table(), "normalized"))
			.to_owned();

		let sql = self.db.build_sql(stmt);
		let mut keys = self
			.db
			.fetch_all(&sql)
			.await?
			.iter()
			.map(|row| row.try_get::<i64, _>(0))
			.collect::<std::result::Result<Vec<_>, _>>()?;
		keys.sort_unstable();
		Ok(keys)
	}

	/// Tags with the given keys, ordered by key
	pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<M>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let stmt = self
			.select_tags()
			.and_where(Expr::col(column(self.tags_table(), "tag_id")).is_in(ids.iter().copied()))
			.order_by(column(self.tags_table(), "tag_id"), Order::Asc)
			.to_owned();
		self.fetch_models(stmt).await
	}

	/// Tags attached to one entity, in attachment order
	pub async fn list_for_object(&self, content_type: &str, object_id: i64) -> Result<Vec<M>> {
		let mut stmt = self.select_tags();
		self.join_taggables(&mut stmt);
		stmt.and_where(Expr::col(column(self.taggables_table(), "taggable_type")).eq(content_type))
			.and_where(Expr::col(column(self.taggables_table(), "taggable_id")).eq(object_id))
			.order_by(column(self.taggables_table(), "id"), Order::Asc);
		self.fetch_models(stmt).await
	}

	/// Tags used by `content_type`, or every tag when `None`
	///
	/// Ordered by name, then key.
	pub async fn list_all(&self, content_type: Option<&str>) -> Result<Vec<M>> {
		let mut stmt = self.select_tags();
		if let Some(content_type) = content_type {
			self.join_taggables(&mut stmt);
			stmt.distinct().and_where(
				Expr::col(column(self.taggables_table(), "taggable_type")).eq(content_type),
			);
		}
		stmt.order_by(column(self.tags_table(), "name"), Order::Asc)
			.order_by(column(self.tags_table(), "tag_id"), Order::Asc);
		self.fetch_models(stmt).await
	}

	/// Tags without any association, ordered by key
	pub async fn list_unused(&self) -> Result<Vec<M>> {
		let stmt = self
			.select_tags()
			.join(
				JoinType::LeftJoin,
				ident(self.taggables_table()),
				Expr::col(column(self.taggables_table(), "tag_id"))
					.equals(column(self.tags_table(), "tag_id")),
			)
			.and_where(Expr::col(column(self.taggables_table(), "tag_id")).is_null())
			.order_by(column(self.tags_table(), "tag_id"), Order::Asc)
			.to_owned();
		self.fetch_models(stmt).await
	}

	/// Tags ranked by association count
	///
	/// Highest count first, ties broken by ascending key. Tags below
	/// `min_count` are dropped.
	pub async fn list_popular(
		&self,
		limit: Option<u64>,
		content_type: Option<&str>,
		min_count: i64,
	) -> Result<Vec<PopularTag<M>>> {
		let count = || Func::count(Expr::col(column(self.taggables_table(), "tag_id")));

		let mut stmt = self.select_tags();
		stmt.expr_as(count(), ident("taggable_count"));
		self.join_taggables(&mut stmt);
		if let Some(content_type) = content_type {
			stmt.and_where(
				Expr::col(column(self.taggables_table(), "taggable_type")).eq(content_type),
			);
		}
		stmt.group_by_col(column(self.tags_table(), "tag_id"))
			.and_having(Expr::expr(count()).gte(min_count))
			.order_by(ident("taggable_count"), Order::Desc)
			.order_by(column(self.tags_table(), "tag_id"), Order::Asc);
		if let Some(limit) = limit {
			stmt.limit(limit);
		}

		let sql = self.db.build_sql(stmt);
		let rows = self.db.fetch_all(&sql).await?;
		rows.iter()
			.map(|row| {
				Ok::<_, TaggableError>(PopularTag {
					tag: M::from_row(row)?,
					count: row.try_get("taggable_count")?,
				})
			})
			.collect()
	}

	/// Rename a tag
	///
	/// Without a content type the tag row itself is renamed, for every
	/// model. Renaming onto a name owned by a different tag fails with
	/// [`TaggableError::RenameConflict`].
	///
	/// With a content type only that type's associations move to the tag
	/// named `new_name`, which is created when missing. Other types keep
	/// the old tag.
	///
	/// Returns the number of tags renamed, `0` when `old_name` is unknown.
	pub async fn rename(
		&self,
		old_name: &str,
		new_name: &str,
		content_type: Option<&str>,
	) -> Result<u64> {
		let new_name = new_name.trim();
		if new_name.is_empty() {
			return Err(TaggableError::InvalidTagInput(
				"new tag name is empty".to_string(),
			));
		}

		let Some(old_tag) = self.find(old_name).await? else {
			return Ok(0);
		};

		match content_type {
			None => self.rename_tag(&old_tag, old_name, new_name).await,
			Some(content_type) => {
				self.move_associations(&old_tag, new_name, content_type)
					.await
			}
		}
	}

	async fn rename_tag(&self, old_tag: &M, old_name: &str, new_name: &str) -> Result<u64> {
		let new_normalized = self.config.normalize(new_name);

		if new_normalized != old_tag.normalized()
			&& let Some(existing) = self.find_by_normalized(&new_normalized).await?
			&& existing.tag_id() != old_tag.tag_id()
		{
			return Err(TaggableError::RenameConflict {
				from: old_name.trim().to_string(),
				to: new_name.to_string(),
			});
		}

		let stmt = Query::update()
			.table(ident(self.tags_table()))
			.values([
				(ident("name"), new_name.into()),
				(ident("normalized"), new_normalized.clone().into()),
				(ident("updated_at"), timestamp_now().into()),
			])
			.and_where(Expr::col(ident("normalized")).eq(old_tag.normalized()))
			.to_owned();

		let renamed = self.db.execute(&self.db.build_sql(stmt)).await?;
		tracing::info!(
			from = %old_tag.name(),
			to = %new_name,
			renamed,
			"Renamed tag"
		);
		Ok(renamed)
	}

	async fn move_associations(
		&self,
		old_tag: &M,
		new_name: &str,
		content_type: &str,
	) -> Result<u64> {
		let target = self.find_or_create(new_name).await?;
		if target.tag_id() == old_tag.tag_id() {
			return Ok(0);
		}

		let taggables = self.taggables_table();
		let mut tx = self.db.begin().await?;

		// Entities already carrying the target tag lose the old association
		// instead of gaining a duplicate one.
		let already_tagged = Query::select()
			.column(ident("taggable_id"))
			.from(ident(taggables))
			.and_where(Expr::col(ident("tag_id")).eq(target.tag_id()))
			.and_where(Expr::col(ident("taggable_type")).eq(content_type))
			.to_owned();
		let already_tagged: Vec<i64> = sqlx::query(&self.db.build_sql(already_tagged))
			.fetch_all(&mut *tx)
			.await?
			.iter()
			.map(|row| row.try_get::<i64, _>("taggable_id"))
			.collect::<std::result::Result<_, _>>()?;

		let mut moved = 0;
		if !already_tagged.is_empty() {
			let stmt = Query::delete()
				.from_table(ident(taggables))
				.and_where(Expr::col(ident("tag_id")).eq(old_tag.tag_id()))
				.and_where(Expr::col(ident("taggable_type")).eq(content_type))
				.and_where(Expr::col(ident("taggable_id")).is_in(already_tagged))
				.to_owned();
			moved += sqlx::query(&self.db.build_sql(stmt))
				.execute(&mut *tx)
				.await?
				.rows_affected();
		}

		let stmt = Query::update()
			.table(ident(taggables))
			.values([
				(ident("tag_id"), target.tag_id().into()),
				(ident("updated_at"), timestamp_now().into()),
			])
			.and_where(Expr::col(ident("tag_id")).eq(old_tag.tag_id()))
			.and_where(Expr::col(ident("taggable_type")).eq(content_type))
			.to_owned();
		moved += sqlx::query(&self.db.build_sql(stmt))
			.execute(&mut *tx)
			.await?
			.rows_affected();

		tx.commit().await?;

		tracing::info!(
			from = %old_tag.name(),
			to = %target.name(),
			content_type = %content_type,
			associations = moved,
			"Renamed tag for content type"
		);
		Ok(u64::from(moved > 0))
	}
}
