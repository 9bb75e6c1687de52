//! Taggable trait definition
//!
//! Trait for models that can be tagged. Implement this trait directly
//! or use the `#[taggable]` attribute macro for auto-generation.

use super::tag::{Tag, TagModel};

/// Trait for models that can be tagged
///
/// Models implementing this trait can be associated with tags via the
/// association table. The trait provides the content type discriminator
/// and object identifier needed for the polymorphic many-to-many
/// relationship, the entity table used by query scopes, and access to the
/// embedded [`TagSet`] that caches the loaded tags.
///
/// # Examples
///
/// ```rust,ignore
/// use reinhardt_taggable::{TagSet, Taggable, Tag};
///
/// struct Food {
///     id: Option<i64>,
///     name: String,
///     tags: TagSet,
/// }
///
/// impl Taggable for Food {
///     type Tag = Tag;
///
///     fn content_type_name() -> &'static str {
///         "Food"
///     }
///
///     fn table_name() -> &'static str {
///         "foods"
///     }
///
///     fn object_id(&self) -> Option<i64> {
///         self.id
///     }
///
///     fn tag_set(&self) -> &TagSet {
///         &self.tags
///     }
///
///     fn tag_set_mut(&mut self) -> &mut TagSet {
///         &mut self.tags
///     }
/// }
/// ```
pub trait Taggable: Send + Sync {
	/// Record type of the tags table
	type Tag: TagModel;

	/// Whether deleting an instance normally only marks it as trashed
	///
	/// Soft-deleted instances keep their tag associations.
	const SOFT_DELETES: bool = false;

	/// Returns the content type name used as discriminator in the association table
	///
	/// This should be a stable, unique identifier for the model type.
	/// Typically the struct name (e.g., "Food", "Article").
	fn content_type_name() -> &'static str;

	/// Entity table queried by tag scopes
	fn table_name() -> &'static str;

	/// Primary key column of [`Self::table_name`]
	fn key_column() -> &'static str {
		"id"
	}

	/// Returns the primary key of this instance, `None` while unsaved
	fn object_id(&self) -> Option<i64>;

	fn tag_set(&self) -> &TagSet<Self::Tag>;

	fn tag_set_mut(&mut self) -> &mut TagSet<Self::Tag>;
}

/// Tags loaded for one entity, in attachment order
///
/// Starts unloaded; every mutating tag operation reloads it.
#[derive(Debug, Clone, PartialEq)]
pub struct TagSet<M = Tag> {
	tags: Vec<M>,
	loaded: bool,
}

impl<M> Default for TagSet<M> {
	fn default() -> Self {
		Self {
			tags: Vec::new(),
			loaded: false,
		}
	}
}

impl<M: TagModel> TagSet<M> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether the set reflects the database at least once
	pub fn is_loaded(&self) -> bool {
		self.loaded
	}

	pub fn len(&self) -> usize {
		self.tags.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tags.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, M> {
		self.tags.iter()
	}

	pub fn as_slice(&self) -> &[M] {
		&self.tags
	}

	pub fn names(&self) -> Vec<String> {
		self.tags.iter().map(|t| t.name().to_string()).collect()
	}

	pub fn normalized_names(&self) -> Vec<String> {
		self.tags.iter().map(|t| t.normalized().to_string()).collect()
	}

	pub fn ids(&self) -> Vec<i64> {
		self.tags.iter().map(TagModel::tag_id).collect()
	}

	/// Exact match on the display name
	pub fn contains_name(&self, name: &str) -> bool {
		self.tags.iter().any(|t| t.name() == name)
	}

	pub fn contains_normalized(&self, normalized: &str) -> bool {
		self.tags.iter().any(|t| t.normalized() == normalized)
	}

	pub fn contains_id(&self, tag_id: i64) -> bool {
		self.tags.iter().any(|t| t.tag_id() == tag_id)
	}

	pub(crate) fn replace(&mut self, tags: Vec<M>) {
		self.tags = tags;
		self.loaded = true;
	}
}

impl<'a, M> IntoIterator for &'a TagSet<M> {
	type Item = &'a M;
	type IntoIter = std::slice::Iter<'a, M>;

	fn into_iter(self) -> Self::IntoIter {
		self.tags.iter()
	}
}
