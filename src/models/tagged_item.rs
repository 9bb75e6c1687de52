//! TaggedItem model definition
//!
//! One row of the polymorphic association table, linking a tag to an
//! entity identified by `(taggable_type, taggable_id)`.

use super::tag::timestamp_column;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::any::AnyRow;

/// Association between a tag and a tagged entity
///
/// `(tag_id, taggable_id, taggable_type)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedItem {
	/// Association key, increasing in attachment order
	pub id: i64,

	pub tag_id: i64,

	/// Primary key of the tagged entity
	pub taggable_id: i64,

	/// Content type discriminator of the tagged entity
	pub taggable_type: String,

	pub created_at: DateTime<Utc>,

	pub updated_at: DateTime<Utc>,
}

impl TaggedItem {
	pub fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
		Ok(Self {
			id: row.try_get("id")?,
			tag_id: row.try_get("tag_id")?,
			taggable_id: row.try_get("taggable_id")?,
			taggable_type: row.try_get("taggable_type")?,
			created_at: timestamp_column(row, "created_at")?,
			updated_at: timestamp_column(row, "updated_at")?,
		})
	}
}
