//! Tag input accepted by tagging operations
//!
//! Callers pass either one delimited string (`"Apple, Banana;Cherry"`) or
//! a list of names. Both are turned into a clean name list by
//! [`TagService::build_tag_name_list`](crate::TagService::build_tag_name_list).

use crate::error::{Result, TaggableError};
use serde_json::Value;

/// A delimited string or an explicit list of tag names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagInput {
	Delimited(String),
	List(Vec<String>),
}

impl TagInput {
	/// Accept a JSON string or array of strings
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_taggable::TagInput;
	/// use serde_json::json;
	///
	/// let input = TagInput::from_json(json!(["Apple", "Banana"])).unwrap();
	/// assert_eq!(input, TagInput::from(vec!["Apple", "Banana"]));
	///
	/// assert!(TagInput::from_json(json!(42)).is_err());
	/// ```
	pub fn from_json(value: Value) -> Result<Self> {
		match value {
			Value::String(s) => Ok(Self::Delimited(s)),
			Value::Array(items) => items
				.into_iter()
				.map(|item| match item {
					Value::String(s) => Ok(s),
					other => Err(TaggableError::InvalidTagInput(format!(
						"expected a tag name, found {}",
						other
					))),
				})
				.collect::<Result<Vec<_>>>()
				.map(Self::List),
			other => Err(TaggableError::InvalidTagInput(format!(
				"expected a string or an array of strings, found {}",
				other
			))),
		}
	}

	/// Split into trimmed, non-empty names
	///
	/// Lists are not split further; a delimited string is split on any
	/// character of `delimiters`.
	pub fn names(&self, delimiters: &str) -> Vec<String> {
		let pieces: Vec<&str> = match self {
			Self::Delimited(s) => s.split(|c: char| delimiters.contains(c)).collect(),
			Self::List(items) => items.iter().map(String::as_str).collect(),
		};
		pieces
			.into_iter()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_string)
			.collect()
	}
}

impl From<&str> for TagInput {
	fn from(value: &str) -> Self {
		Self::Delimited(value.to_string())
	}
}

impl From<String> for TagInput {
	fn from(value: String) -> Self {
		Self::Delimited(value)
	}
}

impl From<&String> for TagInput {
	fn from(value: &String) -> Self {
		Self::Delimited(value.clone())
	}
}

impl From<Vec<String>> for TagInput {
	fn from(value: Vec<String>) -> Self {
		Self::List(value)
	}
}

impl From<Vec<&str>> for TagInput {
	fn from(value: Vec<&str>) -> Self {
		value.into_iter().collect()
	}
}

impl From<&[&str]> for TagInput {
	fn from(value: &[&str]) -> Self {
		value.iter().copied().collect()
	}
}

impl From<&[String]> for TagInput {
	fn from(value: &[String]) -> Self {
		Self::List(value.to_vec())
	}
}

impl<const N: usize> From<[&str; N]> for TagInput {
	fn from(value: [&str; N]) -> Self {
		value.into_iter().collect()
	}
}

impl<S: Into<String>> FromIterator<S> for TagInput {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self::List(iter.into_iter().map(Into::into).collect())
	}
}
