//! # reinhardt-taggable
//!
//! Tagging for Reinhardt models: free-form string tags, normalized so that
//! equivalent spellings are the same tag, stored on a polymorphic
//! association table shared by every taggable model.
//!
//! ## Features
//!
//! - `Tag` model with display name and normalized name, created on first use
//! - `Taggable` trait and `#[taggable]` attribute macro
//! - `TaggableExt`: tag, untag, retag and detag model instances
//! - `TaggableQuery`: filter models by all / any / without-all /
//!   without-any tags, tagged and untagged
//! - Tag statistics: all tags, unused tags, popular tags, renaming
//! - Pluggable normalizers and TOML configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reinhardt_taggable::prelude::*;
//!
//! #[taggable(content_type = "Post", table = "posts")]
//! pub struct Post {
//!     pub id: i64,
//!     pub title: String,
//!     pub tags: TagSet,
//! }
//!
//! let db = TagDatabase::connect("sqlite::memory:").await?;
//! let service: TagService = TagService::new(db, TagConfig::default());
//!
//! post.tag(&service, "Apple, Banana").await?;
//! assert_eq!(post.tag_list(&service), "Apple,Banana");
//!
//! let keys = Post::query(&service).with_any_tags("apple").keys().await?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod input;
pub mod manager;
pub mod models;
pub mod normalizer;
pub mod query;
pub mod schema;
pub mod service;
pub mod store;

// Re-exports for convenient access
pub use backend::{DatabaseBackend, TagDatabase};
pub use config::{TableNames, TagConfig, TagConfigBuilder, TagSettings};
pub use error::{Result, TaggableError};
pub use input::TagInput;
pub use manager::{DeletionMode, TaggableExt};
pub use models::{PopularTag, Tag, TagModel, TagSet, Taggable, TaggedItem};
pub use normalizer::{DefaultNormalizer, Normalizer};
pub use query::TaggableQuery;
pub use service::{TagField, TagService};

pub use reinhardt_taggable_macros::taggable;

/// Prelude module for convenient imports
pub mod prelude {
	pub use crate::backend::TagDatabase;
	pub use crate::config::TagConfig;
	pub use crate::error::{Result, TaggableError};
	pub use crate::input::TagInput;
	pub use crate::manager::{DeletionMode, TaggableExt};
	pub use crate::models::{Tag, TagModel, TagSet, Taggable};
	pub use crate::service::TagService;
	pub use reinhardt_taggable_macros::taggable;
}
