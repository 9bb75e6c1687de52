//! Tag service
//!
//! Orchestrates the normalizer and both stores. Taggable models reach the
//! database exclusively through this type, usually via
//! [`TaggableExt`](crate::TaggableExt).

use crate::backend::TagDatabase;
use crate::config::TagConfig;
use crate::error::{Result, TaggableError};
use crate::input::TagInput;
use crate::models::{PopularTag, Tag, TagModel, Taggable};
use crate::query::TaggableQuery;
use crate::store::{TagStore, TaggedItemStore};
use std::collections::HashSet;
use std::sync::Arc;

/// Which tag column to read when building name lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagField {
	#[default]
	Name,
	Normalized,
}

/// Entry point for all tag operations
///
/// Cheap to clone; clones share the pool and configuration.
///
/// # Examples
///
/// ```rust,ignore
/// use reinhardt_taggable::{TagConfig, TagDatabase, TagService};
///
/// let db = TagDatabase::connect("sqlite::memory:").await?;
/// let service: TagService = TagService::new(db, TagConfig::default());
///
/// let tag = service.find_or_create(" Apple ").await?;
/// assert_eq!(tag.normalized, "apple");
/// ```
pub struct TagService<M: TagModel = Tag> {
	config: Arc<TagConfig>,
	db: TagDatabase,
	tags: TagStore<M>,
	items: TaggedItemStore,
}

impl<M: TagModel> Clone for TagService<M> {
	fn clone(&self) -> Self {
		Self {
			config: Arc::clone(&self.config),
			db: self.db.clone(),
			tags: self.tags.clone(),
			items: self.items.clone(),
		}
	}
}

impl<M: TagModel> TagService<M> {
	pub fn new(db: TagDatabase, config: TagConfig) -> Self {
		let config = Arc::new(config);
		Self {
			tags: TagStore::new(db.clone(), Arc::clone(&config)),
			items: TaggedItemStore::new(db.clone(), Arc::clone(&config)),
			config,
			db,
		}
	}

	/// Build a service, honoring `config.connection`
	///
	/// When the configuration names a connection URL a dedicated pool is
	/// opened for it; otherwise `default_db` is used.
	pub async fn from_config(default_db: TagDatabase, config: TagConfig) -> Result<Self> {
		let db = match &config.connection {
			Some(url) => TagDatabase::connect(url).await?,
			None => default_db,
		};
		Ok(Self::new(db, config))
	}

	pub fn config(&self) -> &TagConfig {
		&self.config
	}

	pub fn database(&self) -> &TagDatabase {
		&self.db
	}

	pub fn tag_store(&self) -> &TagStore<M> {
		&self.tags
	}

	pub fn tagged_item_store(&self) -> &TaggedItemStore {
		&self.items
	}

	/// Trim and normalize a single tag name
	pub fn normalize(&self, name: &str) -> String {
		self.config.normalize(name.trim())
	}

	/// Split tag input into trimmed, non-empty display names
	///
	/// # Examples
	///
	/// ```rust,ignore
	/// assert_eq!(
	///     service.build_tag_name_list("Apple; Banana,,Cherry "),
	///     vec!["Apple", "Banana", "Cherry"],
	/// );
	/// ```
	pub fn build_tag_name_list(&self, input: impl Into<TagInput>) -> Vec<String> {
		input.into().names(&self.config.delimiters)
	}

	/// [`Self::build_tag_name_list`] mapped through the normalizer
	pub fn build_normalized_name_list(&self, input: impl Into<TagInput>) -> Vec<String> {
		self.build_tag_name_list(input)
			.iter()
			.map(|name| self.config.normalize(name))
			.collect()
	}

	/// Join names or normalized names of `tags` with the configured glue
	pub fn tag_list(&self, tags: &[M], field: TagField) -> String {
		tags.iter()
			.map(|tag| match field {
				TagField::Name => tag.name(),
				TagField::Normalized => tag.normalized(),
			})
			.collect::<Vec<_>>()
			.join(&self.config.glue)
	}

	pub async fn find(&self, name: &str) -> Result<Option<M>> {
		self.tags.find(name).await
	}

	pub async fn find_or_create(&self, name: &str) -> Result<M> {
		self.tags.find_or_create(name).await
	}

	pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<M>> {
		self.tags.find_by_ids(ids).await
	}

	/// Keys of existing tags for already normalized names
	pub async fn tag_model_keys(&self, normalized: &[String]) -> Result<Vec<i64>> {
		self.tags.find_many_keys_by_normalized(normalized).await
	}

	/// Tags currently attached to one entity, in attachment order
	pub async fn tags_for(&self, content_type: &str, object_id: i64) -> Result<Vec<M>> {
		self.tags.list_for_object(content_type, object_id).await
	}

	fn require_object_id<T: Taggable>(entity: &T) -> Result<i64> {
		entity
			.object_id()
			.ok_or_else(|| TaggableError::MissingObjectId {
				content_type: T::content_type_name().to_string(),
			})
	}

	/// Attach the given tags, creating missing ones
	///
	/// Logically equal names within one call are attached once.
	pub async fn tag_entity<T>(&self, entity: &mut T, input: impl Into<TagInput>) -> Result<()>
	where
		T: Taggable<Tag = M>,
	{
		let object_id = Self::require_object_id(entity)?;
		let content_type = T::content_type_name();

		let mut seen = HashSet::new();
		let mut attached = 0;
		for name in self.build_tag_name_list(input) {
			if !seen.insert(self.config.normalize(&name)) {
				continue;
			}
			let tag = self.tags.find_or_create(&name).await?;
			if self.items.attach(tag.tag_id(), object_id, content_type).await? {
				attached += 1;
			}
		}

		tracing::info!(
			content_type = %content_type,
			object_id,
			attached,
			"Tagged entity"
		);
		self.load_tags(entity).await
	}

	/// Detach the given tags; unknown names are skipped
	pub async fn untag_entity<T>(&self, entity: &mut T, input: impl Into<TagInput>) -> Result<()>
	where
		T: Taggable<Tag = M>,
	{
		let object_id = Self::require_object_id(entity)?;
		let content_type = T::content_type_name();

		let mut detached = 0;
		for name in self.build_tag_name_list(input) {
			if let Some(tag) = self.tags.find(&name).await?
				&& self.items.detach(tag.tag_id(), object_id, content_type).await?
			{
				detached += 1;
			}
		}

		tracing::info!(
			content_type = %content_type,
			object_id,
			detached,
			"Untagged entity"
		);
		self.load_tags(entity).await
	}

	/// Replace all tags of the entity
	pub async fn retag_entity<T>(&self, entity: &mut T, input: impl Into<TagInput>) -> Result<()>
	where
		T: Taggable<Tag = M>,
	{
		self.detag_entity(entity).await?;
		self.tag_entity(entity, input).await
	}

	/// Remove every tag of the entity
	pub async fn detag_entity<T>(&self, entity: &mut T) -> Result<()>
	where
		T: Taggable<Tag = M>,
	{
		let object_id = Self::require_object_id(entity)?;
		self.items
			.detach_all(object_id, T::content_type_name())
			.await?;
		self.load_tags(entity).await
	}

	/// Attach existing tags by key; unknown keys are skipped
	pub async fn tag_entity_by_ids<T>(&self, entity: &mut T, ids: &[i64]) -> Result<()>
	where
		T: Taggable<Tag = M>,
	{
		let object_id = Self::require_object_id(entity)?;
		let content_type = T::content_type_name();

		for tag in self.tags.find_by_ids(ids).await? {
			self.items
				.attach(tag.tag_id(), object_id, content_type)
				.await?;
		}

		tracing::info!(content_type = %content_type, object_id, ?ids, "Tagged entity by id");
		self.load_tags(entity).await
	}

	/// Detach tags by key
	pub async fn untag_entity_by_ids<T>(&self, entity: &mut T, ids: &[i64]) -> Result<()>
	where
		T: Taggable<Tag = M>,
	{
		let object_id = Self::require_object_id(entity)?;
		let content_type = T::content_type_name();

		for &tag_id in ids {
			self.items.detach(tag_id, object_id, content_type).await?;
		}

		tracing::info!(content_type = %content_type, object_id, ?ids, "Untagged entity by id");
		self.load_tags(entity).await
	}

	pub async fn retag_entity_by_ids<T>(&self, entity: &mut T, ids: &[i64]) -> Result<()>
	where
		T: Taggable<Tag = M>,
	{
		self.detag_entity(entity).await?;
		self.tag_entity_by_ids(entity, ids).await
	}

	/// Refresh the entity's [`TagSet`](crate::TagSet) from the database
	///
	/// An unsaved entity simply gets an empty, loaded set.
	pub async fn load_tags<T>(&self, entity: &mut T) -> Result<()>
	where
		T: Taggable<Tag = M>,
	{
		let tags = match entity.object_id() {
			Some(object_id) => {
				self.tags
					.list_for_object(T::content_type_name(), object_id)
					.await?
			}
			None => Vec::new(),
		};
		entity.tag_set_mut().replace(tags);
		Ok(())
	}

	/// Tags ranked by how many associations use them
	pub async fn popular_tags(
		&self,
		limit: Option<u64>,
		content_type: Option<&str>,
		min_count: i64,
	) -> Result<Vec<PopularTag<M>>> {
		self.tags
			.list_popular(limit, content_type, min_count)
			.await
	}

	/// Rename a tag everywhere, or only for one content type
	///
	/// See [`TagStore::rename`].
	pub async fn rename_tags(
		&self,
		old_name: &str,
		new_name: &str,
		content_type: Option<&str>,
	) -> Result<u64> {
		self.tags.rename(old_name, new_name, content_type).await
	}

	pub async fn all_tags(&self, content_type: Option<&str>) -> Result<Vec<M>> {
		self.tags.list_all(content_type).await
	}

	pub async fn all_tags_array(&self, content_type: Option<&str>) -> Result<Vec<String>> {
		Ok(self
			.all_tags(content_type)
			.await?
			.iter()
			.map(|tag| tag.name().to_string())
			.collect())
	}

	/// Normalized names in use, sorted
	pub async fn all_tags_array_normalized(&self, content_type: Option<&str>) -> Result<Vec<String>> {
		let mut names: Vec<String> = self
			.all_tags(content_type)
			.await?
			.iter()
			.map(|tag| tag.normalized().to_string())
			.collect();
		names.sort();
		Ok(names)
	}

	pub async fn all_tags_list(&self, content_type: Option<&str>) -> Result<String> {
		let tags = self.all_tags(content_type).await?;
		Ok(self.tag_list(&tags, TagField::Name))
	}

	/// Tags no entity uses any more
	pub async fn unused_tags(&self) -> Result<Vec<M>> {
		self.tags.list_unused().await
	}

	/// Keys of the `content_type` entities carrying the named tag
	pub async fn tagged_object_ids(&self, name: &str, content_type: &str) -> Result<Vec<i64>> {
		match self.tags.find(name).await? {
			Some(tag) => {
				self.items
					.tagged_object_ids(tag.tag_id(), content_type)
					.await
			}
			None => Ok(Vec::new()),
		}
	}

	/// Start a tag-filtered query over `T`'s table
	pub fn query<T>(&self) -> TaggableQuery<T>
	where
		T: Taggable<Tag = M>,
	{
		TaggableQuery::new(self.clone())
	}
}
