//! Tag model definition
//!
//! A tag row carries the display name as first written and the normalized
//! name used for identity. Rows are created lazily and never removed by the
//! tagging operations themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::any::AnyRow;
use std::fmt;

/// Record type read from the tags table
///
/// The store manages `tag_id`, `name`, `normalized` and the timestamps.
/// Implement this for a custom struct to read additional columns of the
/// tags table; every query selects the full row.
///
/// # Examples
///
/// ```rust,ignore
/// use reinhardt_taggable::models::TagModel;
/// use sqlx::{Row, any::AnyRow};
///
/// #[derive(Debug, Clone)]
/// struct ColoredTag {
///     tag_id: i64,
///     name: String,
///     normalized: String,
///     color: Option<String>,
/// }
///
/// impl TagModel for ColoredTag {
///     fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
///         Ok(Self {
///             tag_id: row.try_get("tag_id")?,
///             name: row.try_get("name")?,
///             normalized: row.try_get("normalized")?,
///             color: row.try_get("color")?,
///         })
///     }
///
///     fn tag_id(&self) -> i64 { self.tag_id }
///     fn name(&self) -> &str { &self.name }
///     fn normalized(&self) -> &str { &self.normalized }
/// }
/// ```
pub trait TagModel: fmt::Debug + Clone + Send + Sync + Unpin + 'static {
	fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error>;

	fn tag_id(&self) -> i64;

	/// Display name
	fn name(&self) -> &str;

	/// Normalized name, the identity of the tag
	fn normalized(&self) -> &str;
}

/// Tag entity
///
/// # Examples
///
/// ```rust,ignore
/// let tag = service.find_or_create("  Apple ").await?;
/// assert_eq!(tag.name, "Apple");
/// assert_eq!(tag.normalized, "apple");
/// assert_eq!(tag.to_string(), "Apple");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
	pub tag_id: i64,

	/// Display name, trimmed
	pub name: String,

	/// Normalized form of `name`, used for lookups
	pub normalized: String,

	pub created_at: DateTime<Utc>,

	pub updated_at: DateTime<Utc>,
}

impl TagModel for Tag {
	fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
		Ok(Self {
			tag_id: row.try_get("tag_id")?,
			name: row.try_get("name")?,
			normalized: row.try_get("normalized")?,
			created_at: timestamp_column(row, "created_at")?,
			updated_at: timestamp_column(row, "updated_at")?,
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

impl fmt::Display for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)
	}
}

/// A tag together with the number of associations pointing at it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularTag<M = Tag> {
	pub tag: M,
	pub count: i64,
}

/// Read an RFC 3339 text column as a UTC timestamp
pub fn timestamp_column(row: &AnyRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
	let raw: String = row.try_get(column)?;
	DateTime::parse_from_rfc3339(&raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| sqlx::Error::ColumnDecode {
			index: column.to_string(),
			source: Box::new(e),
		})
}

/// Current time in the stored text format
pub(crate) fn timestamp_now() -> String {
	Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
