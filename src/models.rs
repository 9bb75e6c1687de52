//! Model definitions for the tagging system
//!
//! This module contains the core data models:
//! - `Tag`: Tag entity with display name and normalized name
//! - `TaggedItem`: Row of the polymorphic association table
//! - `Taggable`: Trait for models that can be tagged, with its `TagSet` component

pub mod tag;
pub mod taggable;
pub mod tagged_item;

pub use tag::{PopularTag, Tag, TagModel};
pub use taggable::{TagSet, Taggable};
pub use tagged_item::TaggedItem;
