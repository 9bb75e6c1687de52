//! Tag-filtered queries over a taggable model's table
//!
//! Each scope joins the association table under its own alias,
//! `<taggables>_<scope>_<n>`, restricted to the model's content type. The
//! entity key is grouped once so scopes chain freely, with the tag
//! conditions expressed as `HAVING` clauses over the grouped rows.
//!
//! Scopes are recorded when added and resolved to tag keys when the query
//! executes.
//!
//! # Examples
//!
//! ```rust,ignore
//! use reinhardt_taggable::prelude::*;
//!
//! // Posts tagged with both Apple and Banana, but not Cherry
//! let keys = Post::query(&service)
//!     .with_all_tags("Apple,Banana")
//!     .without_any_tags("Cherry", false)
//!     .keys()
//!     .await?;
//! ```

use crate::error::{Result, TaggableError};
use crate::input::TagInput;
use crate::models::Taggable;
use crate::service::TagService;
use crate::store::{column, ident};
use sea_query::{
	Alias, Asterisk, Condition, Expr, ExprTrait, Func, JoinType, Order, Query, SelectStatement,
};
use sqlx::Row;
use sqlx::any::AnyRow;
use std::collections::HashSet;
use std::marker::PhantomData;

#[derive(Debug, Clone)]
enum Scope {
	WithAllTags(TagInput),
	WithAnyTags(TagInput),
	WithoutAllTags {
		tags: TagInput,
		include_untagged: bool,
	},
	WithoutAnyTags {
		tags: TagInput,
		include_untagged: bool,
	},
	IsTagged,
	IsNotTagged,
}

impl Scope {
	fn name(&self) -> &'static str {
		match self {
			Self::WithAllTags(_) => "withAllTags",
			Self::WithAnyTags(_) => "withAnyTags",
			Self::WithoutAllTags { .. } => "withoutAllTags",
			Self::WithoutAnyTags { .. } => "withoutAnyTags",
			Self::IsTagged => "isTagged",
			Self::IsNotTagged => "isNotTagged",
		}
	}
}

/// A scope with its tag names resolved to keys
#[derive(Debug)]
enum ResolvedScope {
	/// No row can match
	Nothing,
	AllOf(Vec<i64>),
	AnyOf(Vec<i64>),
	NotAllOf {
		keys: Vec<i64>,
		include_untagged: bool,
	},
	NoneOf {
		keys: Vec<i64>,
		include_untagged: bool,
	},
	Tagged,
	Untagged,
}

/// Query builder filtering `T` rows by their tags
pub struct TaggableQuery<T: Taggable> {
	service: TagService<T::Tag>,
	scopes: Vec<Scope>,
	filters: Vec<Condition>,
	limit: Option<u64>,
	_model: PhantomData<fn() -> T>,
}

impl<T: Taggable> Clone for TaggableQuery<T> {
	fn clone(&self) -> Self {
		Self {
			service: self.service.clone(),
			scopes: self.scopes.clone(),
			filters: self.filters.clone(),
			limit: self.limit,
			_model: PhantomData,
		}
	}
}

impl<T: Taggable> TaggableQuery<T> {
	pub fn new(service: TagService<T::Tag>) -> Self {
		Self {
			service,
			scopes: Vec::new(),
			filters: Vec::new(),
			limit: None,
			_model: PhantomData,
		}
	}

	/// Rows carrying every one of the given tags
	///
	/// Naming a tag that does not exist matches nothing.
	pub fn with_all_tags(mut self, tags: impl Into<TagInput>) -> Self {
		self.scopes.push(Scope::WithAllTags(tags.into()));
		self
	}

	/// Rows carrying at least one of the given tags
	pub fn with_any_tags(mut self, tags: impl Into<TagInput>) -> Self {
		self.scopes.push(Scope::WithAnyTags(tags.into()));
		self
	}

	/// Rows missing at least one of the given tags
	///
	/// Untagged rows are excluded unless `include_untagged` is set.
	pub fn without_all_tags(mut self, tags: impl Into<TagInput>, include_untagged: bool) -> Self {
		self.scopes.push(Scope::WithoutAllTags {
			tags: tags.into(),
			include_untagged,
		});
		self
	}

	/// Rows carrying none of the given tags
	///
	/// Untagged rows are excluded unless `include_untagged` is set.
	pub fn without_any_tags(mut self, tags: impl Into<TagInput>, include_untagged: bool) -> Self {
		self.scopes.push(Scope::WithoutAnyTags {
			tags: tags.into(),
			include_untagged,
		});
		self
	}

	/// Rows with at least one tag
	pub fn is_tagged(mut self) -> Self {
		self.scopes.push(Scope::IsTagged);
		self
	}

	/// Rows without any tag
	pub fn is_not_tagged(mut self) -> Self {
		self.scopes.push(Scope::IsNotTagged);
		self
	}

	/// Extra condition on the model's own columns
	pub fn filter(mut self, condition: Condition) -> Self {
		self.filters.push(condition);
		self
	}

	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = Some(limit);
		self
	}

	/// Resolve tag names for one all/any scope
	///
	/// Returns `None` when the scope can match nothing.
	async fn resolve_required(&self, scope: &Scope, tags: &TagInput) -> Result<Option<Vec<i64>>> {
		let names: Vec<String> = self
			.service
			.build_normalized_name_list(tags.clone())
			.into_iter()
			.collect::<HashSet<_>>()
			.into_iter()
			.collect();

		if names.is_empty() {
			if self.service.config().throw_empty_exceptions {
				return Err(TaggableError::NoTagsSpecified {
					scope: scope.name(),
				});
			}
			return Ok(None);
		}

		let keys = self.service.tag_model_keys(&names).await?;
		if keys.is_empty() {
			return Ok(None);
		}
		if matches!(scope, Scope::WithAllTags(_)) && keys.len() != names.len() {
			return Ok(None);
		}
		Ok(Some(keys))
	}

	async fn resolve_keys(&self, tags: &TagInput) -> Result<Vec<i64>> {
		let names = self.service.build_normalized_name_list(tags.clone());
		self.service.tag_model_keys(&names).await
	}

	async fn resolve(&self) -> Result<Vec<ResolvedScope>> {
		let mut resolved = Vec::with_capacity(self.scopes.len());
		for scope in &self.scopes {
			let next = match scope {
				Scope::WithAllTags(tags) => match self.resolve_required(scope, tags).await? {
					Some(keys) => ResolvedScope::AllOf(keys),
					None => ResolvedScope::Nothing,
				},
				Scope::WithAnyTags(tags) => match self.resolve_required(scope, tags).await? {
					Some(keys) => ResolvedScope::AnyOf(keys),
					None => ResolvedScope::Nothing,
				},
				Scope::WithoutAllTags {
					tags,
					include_untagged,
				} => ResolvedScope::NotAllOf {
					keys: self.resolve_keys(tags).await?,
					include_untagged: *include_untagged,
				},
				Scope::WithoutAnyTags {
					tags,
					include_untagged,
				} => ResolvedScope::NoneOf {
					keys: self.resolve_keys(tags).await?,
					include_untagged: *include_untagged,
				},
				Scope::IsTagged => ResolvedScope::Tagged,
				Scope::IsNotTagged => ResolvedScope::Untagged,
			};
			resolved.push(next);
		}
		Ok(resolved)
	}

	fn join_taggables(
		stmt: &mut SelectStatement,
		join_type: JoinType,
		taggables: &str,
		alias: &str,
	) {
		stmt.join_as(
			join_type,
			ident(taggables),
			ident(alias),
			Condition::all()
				.add(
					Expr::col(column(T::table_name(), T::key_column()))
						.equals(column(alias, "taggable_id")),
				)
				.add(Expr::col(column(alias, "taggable_type")).eq(T::content_type_name())),
		);
	}

	/// `COUNT(DISTINCT CASE WHEN alias.tag_id IN (keys) THEN alias.tag_id END)`
	fn matched_count(alias: &str, keys: &[i64]) -> Expr {
		Expr::expr(Func::count_distinct(
			Expr::case(
				Expr::col(column(alias, "tag_id")).is_in(keys.iter().copied()),
				Expr::col(column(alias, "tag_id")),
			),
		))
	}

	fn distinct_count(alias: &str, name: &str) -> Expr {
		Expr::expr(Func::count_distinct(Expr::col(column(alias, name))))
	}

	fn build(&self, resolved: &[ResolvedScope], projection: Projection) -> SelectStatement {
		let table = T::table_name();
		let key = T::key_column();
		let taggables = self.service.config().tables.taggables.clone();

		let mut stmt = Query::select();
		match projection {
			Projection::Rows => stmt.column((ident(table), Asterisk)),
			Projection::Keys => stmt.column(column(table, key)),
		};
		stmt.from(ident(table));

		let mut joined = false;
		for (seq, scope) in resolved.iter().enumerate() {
			let alias_for = |scope_name: &str| {
				format!("{}_{}_{}", taggables, scope_name.to_lowercase(), seq + 1)
			};
			match scope {
				ResolvedScope::Nothing => {
					stmt.and_where(Expr::val(1).eq(0));
				}
				ResolvedScope::AllOf(keys) => {
					let alias = alias_for("withAllTags");
					Self::join_taggables(&mut stmt, JoinType::InnerJoin, &taggables, &alias);
					stmt.and_where(
						Expr::col(column(&alias, "tag_id")).is_in(keys.iter().copied()),
					)
					.and_having(Self::distinct_count(&alias, "tag_id").eq(keys.len() as i64));
					joined = true;
				}
				ResolvedScope::AnyOf(keys) => {
					let alias = alias_for("withAnyTags");
					Self::join_taggables(&mut stmt, JoinType::InnerJoin, &taggables, &alias);
					stmt.and_where(
						Expr::col(column(&alias, "tag_id")).is_in(keys.iter().copied()),
					);
					joined = true;
				}
				ResolvedScope::Tagged => {
					let alias = alias_for("isTagged");
					Self::join_taggables(&mut stmt, JoinType::InnerJoin, &taggables, &alias);
					joined = true;
				}
				ResolvedScope::NotAllOf {
					keys,
					include_untagged,
				} => {
					let alias = alias_for("withoutAllTags");
					Self::join_taggables(&mut stmt, JoinType::LeftJoin, &taggables, &alias);
					if keys.is_empty() {
						// COUNT(...) < 0 never holds
						stmt.and_where(Expr::val(1).eq(0));
					} else {
						stmt.and_having(
							Self::matched_count(&alias, keys).lt(keys.len() as i64),
						);
					}
					if !include_untagged {
						stmt.and_having(Self::distinct_count(&alias, "tag_id").gt(0));
					}
					joined = true;
				}
				ResolvedScope::NoneOf {
					keys,
					include_untagged,
				} => {
					let alias = alias_for("withoutAnyTags");
					Self::join_taggables(&mut stmt, JoinType::LeftJoin, &taggables, &alias);
					if !keys.is_empty() {
						stmt.and_having(Self::matched_count(&alias, keys).eq(0));
					}
					if !include_untagged {
						stmt.and_having(Self::distinct_count(&alias, "tag_id").gt(0));
					}
					joined = true;
				}
				ResolvedScope::Untagged => {
					let alias = alias_for("isNotTagged");
					Self::join_taggables(&mut stmt, JoinType::LeftJoin, &taggables, &alias);
					stmt.and_having(Self::distinct_count(&alias, "taggable_id").eq(0));
					joined = true;
				}
			}
		}

		for condition in &self.filters {
			stmt.cond_where(condition.clone());
		}
		if joined {
			stmt.group_by_col(column(table, key));
		}
		stmt.order_by(column(table, key), Order::Asc);
		if let Some(limit) = self.limit {
			stmt.limit(limit);
		}
		stmt
	}

	async fn statement(&self, projection: Projection) -> Result<SelectStatement> {
		let resolved = self.resolve().await?;
		Ok(self.build(&resolved, projection))
	}

	/// Render the query for the configured backend
	pub async fn to_sql(&self) -> Result<String> {
		let stmt = self.statement(Projection::Rows).await?;
		Ok(self.service.database().build_sql(stmt))
	}

	/// Keys of the matching rows, ascending
	pub async fn keys(&self) -> Result<Vec<i64>> {
		let db = self.service.database();
		let sql = db.build_sql(self.statement(Projection::Keys).await?);
		let rows = db.fetch_all(&sql).await?;
		Ok(rows
			.iter()
			.map(|row| row.try_get::<i64, _>(0))
			.collect::<std::result::Result<_, _>>()?)
	}

	/// Number of matching rows
	pub async fn count(&self) -> Result<i64> {
		let db = self.service.database();
		let inner = self.statement(Projection::Keys).await?;
		let stmt = Query::select()
			.expr(Func::count(Expr::col(Asterisk)))
			.from_subquery(inner, Alias::new("tagged_rows"))
			.to_owned();
		let sql = db.build_sql(stmt);
		let row = db.fetch_optional(&sql).await?;
		Ok(match row {
			Some(row) => row.try_get(0)?,
			None => 0,
		})
	}

	/// Matching rows of `T`'s table, decoded as `R`
	pub async fn fetch_all<R>(&self) -> Result<Vec<R>>
	where
		R: for<'r> sqlx::FromRow<'r, AnyRow> + Send + Unpin,
	{
		let db = self.service.database();
		let sql = db.build_sql(self.statement(Projection::Rows).await?);
		Ok(sqlx::query_as::<_, R>(&sql).fetch_all(db.pool()).await?)
	}
}

#[derive(Debug, Clone, Copy)]
enum Projection {
	Rows,
	Keys,
}
