//! Tagging configuration
//!
//! [`TagSettings`] is the serde-facing form, loadable from TOML.
//! [`TagConfig`] is the runtime form handed to [`TagService`](crate::TagService),
//! holding the resolved normalizer strategy.

use crate::error::{Result, TaggableError};
use crate::normalizer::{self, DefaultNormalizer, FnNormalizer, Normalizer};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_DELIMITERS: &str = ",;";
pub const DEFAULT_GLUE: &str = ",";
pub const DEFAULT_TAGS_TABLE: &str = "taggable_tags";
pub const DEFAULT_TAGGABLES_TABLE: &str = "taggable_taggables";

/// Names of the two tables owned by the tagging system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
	/// Tag entity table
	pub tags: String,
	/// Polymorphic association table
	pub taggables: String,
}

impl Default for TableNames {
	fn default() -> Self {
		Self {
			tags: DEFAULT_TAGS_TABLE.to_string(),
			taggables: DEFAULT_TAGGABLES_TABLE.to_string(),
		}
	}
}

/// Deserializable tagging settings
///
/// # Examples
///
/// ```
/// use reinhardt_taggable::config::TagSettings;
///
/// let settings = TagSettings::from_toml(r#"
/// delimiters = ",|"
/// glue = " | "
/// throw_empty_exceptions = true
///
/// [tables]
/// tags = "labels"
/// "#).unwrap();
///
/// assert_eq!(settings.glue, " | ");
/// assert_eq!(settings.tables.tags, "labels");
/// assert_eq!(settings.tables.taggables, "taggable_taggables");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSettings {
	/// Characters that separate tags in a delimited string
	pub delimiters: String,
	/// String placed between names when joining a tag list
	pub glue: String,
	/// Normalizer name: `lowercase`, `ascii_lowercase` or `identity`
	pub normalizer: String,
	/// Database URL used instead of the application default
	pub connection: Option<String>,
	/// Fail all/any scopes given no tags instead of matching nothing
	pub throw_empty_exceptions: bool,
	pub tables: TableNames,
}

impl Default for TagSettings {
	fn default() -> Self {
		Self {
			delimiters: DEFAULT_DELIMITERS.to_string(),
			glue: DEFAULT_GLUE.to_string(),
			normalizer: "lowercase".to_string(),
			connection: None,
			throw_empty_exceptions: false,
			tables: TableNames::default(),
		}
	}
}

impl TagSettings {
	/// Parse settings from a TOML string.
	pub fn from_toml(content: &str) -> Result<Self> {
		toml::from_str(content).map_err(|e| TaggableError::ConfigError(e.to_string()))
	}

	/// Load settings from a TOML file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| {
			TaggableError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
		})?;
		Self::from_toml(&content)
	}
}

/// Runtime tagging configuration
#[derive(Debug, Clone)]
pub struct TagConfig {
	pub delimiters: String,
	pub glue: String,
	pub normalizer: Arc<dyn Normalizer>,
	pub connection: Option<String>,
	pub throw_empty_exceptions: bool,
	pub tables: TableNames,
}

impl Default for TagConfig {
	fn default() -> Self {
		Self {
			delimiters: DEFAULT_DELIMITERS.to_string(),
			glue: DEFAULT_GLUE.to_string(),
			normalizer: Arc::new(DefaultNormalizer),
			connection: None,
			throw_empty_exceptions: false,
			tables: TableNames::default(),
		}
	}
}

impl TagConfig {
	pub fn builder() -> TagConfigBuilder {
		TagConfigBuilder::default()
	}

	/// Normalize a single, already trimmed, tag name
	pub fn normalize(&self, name: &str) -> String {
		self.normalizer.normalize(name)
	}
}

impl TryFrom<TagSettings> for TagConfig {
	type Error = TaggableError;

	fn try_from(settings: TagSettings) -> Result<Self> {
		let normalizer = normalizer::by_name(&settings.normalizer).ok_or_else(|| {
			TaggableError::ConfigError(format!("Unknown normalizer '{}'", settings.normalizer))
		})?;

		Ok(Self {
			delimiters: settings.delimiters,
			glue: settings.glue,
			normalizer,
			connection: settings.connection,
			throw_empty_exceptions: settings.throw_empty_exceptions,
			tables: settings.tables,
		})
	}
}

/// Builder for [`TagConfig`]
///
/// # Examples
///
/// ```
/// use reinhardt_taggable::config::TagConfig;
///
/// let config = TagConfig::builder()
///     .delimiters(",")
///     .glue(";")
///     .normalizer_fn(|s: &str| s.chars().rev().collect())
///     .build();
///
/// assert_eq!(config.normalize("abc"), "cba");
/// ```
#[derive(Debug, Default)]
pub struct TagConfigBuilder {
	config: TagConfig,
}

impl TagConfigBuilder {
	pub fn delimiters(mut self, delimiters: impl Into<String>) -> Self {
		self.config.delimiters = delimiters.into();
		self
	}

	pub fn glue(mut self, glue: impl Into<String>) -> Self {
		self.config.glue = glue.into();
		self
	}

	pub fn normalizer<N: Normalizer + 'static>(mut self, normalizer: N) -> Self {
		self.config.normalizer = Arc::new(normalizer);
		self
	}

	pub fn normalizer_fn<F>(self, func: F) -> Self
	where
		F: Fn(&str) -> String + Send + Sync + 'static,
	{
		self.normalizer(FnNormalizer::new(func))
	}

	pub fn connection(mut self, url: impl Into<String>) -> Self {
		self.config.connection = Some(url.into());
		self
	}

	pub fn throw_empty_exceptions(mut self, enabled: bool) -> Self {
		self.config.throw_empty_exceptions = enabled;
		self
	}

	pub fn tags_table(mut self, table: impl Into<String>) -> Self {
		self.config.tables.tags = table.into();
		self
	}

	pub fn taggables_table(mut self, table: impl Into<String>) -> Self {
		self.config.tables.taggables = table.into();
		self
	}

	pub fn build(self) -> TagConfig {
		self.config
	}
}
