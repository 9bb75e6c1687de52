//! Tag operations on taggable model instances
//!
//! [`TaggableExt`] is implemented for every [`Taggable`] type and forwards
//! to a [`TagService`]. Instance methods act on one entity and keep its
//! [`TagSet`](crate::TagSet) in sync; associated functions act on the
//! whole content type.

use crate::error::Result;
use crate::input::TagInput;
use crate::models::{PopularTag, TagModel, Taggable};
use crate::query::TaggableQuery;
use crate::service::{TagField, TagService};
use async_trait::async_trait;

/// How an entity is being deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionMode {
	/// Marked as trashed, row kept
	Soft,
	/// Row removed
	Force,
}

/// Tagging methods for [`Taggable`] models
///
/// # Examples
///
/// ```rust,ignore
/// use reinhardt_taggable::prelude::*;
///
/// let mut post = Post::create(&pool, "Hello").await?;
/// post.tag(&service, "Apple,Banana").await?;
/// post.untag(&service, "banana").await?;
///
/// assert_eq!(post.tag_list(&service), "Apple");
/// assert!(post.has_tag(&service, "APPLE"));
/// ```
#[async_trait]
pub trait TaggableExt: Taggable + Sized {
	/// Attach tags, creating missing ones
	async fn tag<I>(&mut self, service: &TagService<Self::Tag>, tags: I) -> Result<()>
	where
		I: Into<TagInput> + Send,
	{
		service.tag_entity(self, tags).await
	}

	/// Detach tags; unknown names are ignored
	async fn untag<I>(&mut self, service: &TagService<Self::Tag>, tags: I) -> Result<()>
	where
		I: Into<TagInput> + Send,
	{
		service.untag_entity(self, tags).await
	}

	/// Replace all tags
	async fn retag<I>(&mut self, service: &TagService<Self::Tag>, tags: I) -> Result<()>
	where
		I: Into<TagInput> + Send,
	{
		service.retag_entity(self, tags).await
	}

	/// Remove all tags
	async fn detag(&mut self, service: &TagService<Self::Tag>) -> Result<()> {
		service.detag_entity(self).await
	}

	async fn tag_by_id(&mut self, service: &TagService<Self::Tag>, ids: &[i64]) -> Result<()> {
		service.tag_entity_by_ids(self, ids).await
	}

	async fn untag_by_id(&mut self, service: &TagService<Self::Tag>, ids: &[i64]) -> Result<()> {
		service.untag_entity_by_ids(self, ids).await
	}

	async fn retag_by_id(&mut self, service: &TagService<Self::Tag>, ids: &[i64]) -> Result<()> {
		service.retag_entity_by_ids(self, ids).await
	}

	/// Reload the embedded tag set
	async fn load_tags(&mut self, service: &TagService<Self::Tag>) -> Result<()> {
		service.load_tags(self).await
	}

	/// Loaded tag names joined with the configured glue
	fn tag_list(&self, service: &TagService<Self::Tag>) -> String {
		service.tag_list(self.tag_set().as_slice(), TagField::Name)
	}

	fn tag_list_normalized(&self, service: &TagService<Self::Tag>) -> String {
		service.tag_list(self.tag_set().as_slice(), TagField::Normalized)
	}

	fn tag_array(&self) -> Vec<String> {
		self.tag_set().names()
	}

	fn tag_array_normalized(&self) -> Vec<String> {
		self.tag_set().normalized_names()
	}

	/// Whether a loaded tag normalizes to the same name as `name`
	fn has_tag(&self, service: &TagService<Self::Tag>, name: &str) -> bool {
		self.tag_set().contains_normalized(&service.normalize(name))
	}

	/// Whether a loaded tag has the same normalized value as `tag`
	fn has_tag_model(&self, tag: &Self::Tag) -> bool {
		self.tag_set().contains_normalized(tag.normalized())
	}

	/// Deletion hook
	///
	/// Call before deleting the entity. Associations are removed on a
	/// permanent delete, or on any delete of a type without soft deletes.
	/// Returns whether they were removed.
	async fn deleting(
		&mut self,
		service: &TagService<Self::Tag>,
		mode: DeletionMode,
	) -> Result<bool> {
		if self.object_id().is_none() {
			return Ok(false);
		}
		if Self::SOFT_DELETES && mode == DeletionMode::Soft {
			tracing::debug!(
				content_type = %Self::content_type_name(),
				"Soft delete keeps tags"
			);
			return Ok(false);
		}
		service.detag_entity(self).await?;
		Ok(true)
	}

	/// Tags used by this content type, ordered by name
	async fn all_tag_models(service: &TagService<Self::Tag>) -> Result<Vec<Self::Tag>> {
		service.all_tags(Some(Self::content_type_name())).await
	}

	/// Names of the tags used by this content type, ordered
	async fn all_tags(service: &TagService<Self::Tag>) -> Result<Vec<String>> {
		service
			.all_tags_array(Some(Self::content_type_name()))
			.await
	}

	async fn all_tags_list(service: &TagService<Self::Tag>) -> Result<String> {
		service.all_tags_list(Some(Self::content_type_name())).await
	}

	/// `(name, count)` pairs, most used first
	async fn popular_tags(
		service: &TagService<Self::Tag>,
		limit: Option<u64>,
		min_count: i64,
	) -> Result<Vec<(String, i64)>> {
		let popular = service
			.popular_tags(limit, Some(Self::content_type_name()), min_count)
			.await?;
		Ok(pairs(popular, <Self::Tag as TagModel>::name))
	}

	/// `(normalized, count)` pairs, most used first
	async fn popular_tags_normalized(
		service: &TagService<Self::Tag>,
		limit: Option<u64>,
		min_count: i64,
	) -> Result<Vec<(String, i64)>> {
		let popular = service
			.popular_tags(limit, Some(Self::content_type_name()), min_count)
			.await?;
		Ok(pairs(popular, <Self::Tag as TagModel>::normalized))
	}

	/// Rename a tag for this content type only
	async fn rename_tag(
		service: &TagService<Self::Tag>,
		old_name: &str,
		new_name: &str,
	) -> Result<u64> {
		service
			.rename_tags(old_name, new_name, Some(Self::content_type_name()))
			.await
	}

	/// Keys of the instances carrying the named tag
	async fn keys_tagged_with(service: &TagService<Self::Tag>, name: &str) -> Result<Vec<i64>> {
		service
			.tagged_object_ids(name, Self::content_type_name())
			.await
	}

	fn query(service: &TagService<Self::Tag>) -> TaggableQuery<Self> {
		service.query::<Self>()
	}
}

impl<T: Taggable> TaggableExt for T {}

fn pairs<M: TagModel>(popular: Vec<PopularTag<M>>, field: fn(&M) -> &str) -> Vec<(String, i64)> {
	popular
		.into_iter()
		.map(|p| (field(&p.tag).to_string(), p.count))
		.collect()
}
