//! Tag name normalization
//!
//! A normalizer maps a trimmed display name to the form used for identity
//! comparison. Two tags are the same tag when their normalized forms match.

use std::fmt;
use std::sync::Arc;

/// Strategy turning a tag name into its normalized form
pub trait Normalizer: Send + Sync + fmt::Debug {
	fn normalize(&self, name: &str) -> String;
}

/// Full Unicode lowercase, locale independent
///
/// Accents are kept, so `"école"` and `"ecole"` stay distinct tags.
///
/// # Examples
///
/// ```
/// use reinhardt_taggable::normalizer::{DefaultNormalizer, Normalizer};
///
/// assert_eq!(DefaultNormalizer.normalize("ÉCOLE"), "école");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNormalizer;

impl Normalizer for DefaultNormalizer {
	fn normalize(&self, name: &str) -> String {
		name.to_lowercase()
	}
}

/// ASCII-only lowercase; non-ASCII letters pass through untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiNormalizer;

impl Normalizer for AsciiNormalizer {
	fn normalize(&self, name: &str) -> String {
		name.to_ascii_lowercase()
	}
}

/// Leaves names as they are, making tags case sensitive
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl Normalizer for IdentityNormalizer {
	fn normalize(&self, name: &str) -> String {
		name.to_string()
	}
}

/// Normalizer backed by a closure
///
/// # Examples
///
/// ```
/// use reinhardt_taggable::normalizer::{FnNormalizer, Normalizer};
///
/// let reverse = FnNormalizer::new(|s: &str| s.chars().rev().collect());
/// assert_eq!(reverse.normalize("Apple"), "elppA");
/// ```
#[derive(Clone)]
pub struct FnNormalizer {
	func: Arc<dyn Fn(&str) -> String + Send + Sync>,
}

impl FnNormalizer {
	pub fn new<F>(func: F) -> Self
	where
		F: Fn(&str) -> String + Send + Sync + 'static,
	{
		Self {
			func: Arc::new(func),
		}
	}
}

impl fmt::Debug for FnNormalizer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnNormalizer").finish_non_exhaustive()
	}
}

impl Normalizer for FnNormalizer {
	fn normalize(&self, name: &str) -> String {
		(self.func)(name)
	}
}

/// Resolve a normalizer from its settings name
///
/// Returns `None` for unknown names.
pub fn by_name(name: &str) -> Option<Arc<dyn Normalizer>> {
	match name {
		"lowercase" | "mb_strtolower" => Some(Arc::new(DefaultNormalizer)),
		"ascii_lowercase" | "strtolower" => Some(Arc::new(AsciiNormalizer)),
		"identity" => Some(Arc::new(IdentityNormalizer)),
		_ => None,
	}
}
