//! Persistence for tags and associations
//!
//! - [`TagStore`]: tag rows
//! - [`TaggedItemStore`]: the polymorphic association rows

pub mod tagged_items;
pub mod tags;

pub use tagged_items::TaggedItemStore;
pub use tags::TagStore;

use sea_query::Alias;

pub(crate) fn ident(name: &str) -> Alias {
	Alias::new(name.to_string())
}

/// `(table, column)` reference
pub(crate) fn column(table: &str, name: &str) -> (Alias, Alias) {
	(ident(table), ident(name))
}
