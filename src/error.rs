use thiserror::Error;

/// Errors that can occur in the tagging system
#[derive(Debug, Error)]
pub enum TaggableError {
	/// Tag input could not be turned into a list of tag names
	#[error("Invalid tag input: {0}")]
	InvalidTagInput(String),

	/// An all/any tag scope received no tag names
	///
	/// Only raised when `throw_empty_exceptions` is enabled; otherwise the
	/// scope matches nothing.
	#[error("Empty tag data passed to {scope} scope")]
	NoTagsSpecified { scope: &'static str },

	/// An unscoped rename would collide with a different existing tag
	#[error("Cannot rename tag '{from}' to '{to}': a different tag already uses that name")]
	RenameConflict { from: String, to: String },

	/// The entity has no primary key yet
	#[error("Object of type '{content_type}' has no primary key")]
	MissingObjectId { content_type: String },

	/// Configuration error
	#[error("Configuration error: {0}")]
	ConfigError(String),

	/// Database error from sqlx
	#[error("Database error: {0}")]
	Database(#[from] sqlx::Error),
}

impl TaggableError {
	/// Whether a unique index rejected the statement
	///
	/// Inserts racing on backends without `ON CONFLICT` surface this way.
	pub fn is_unique_violation(&self) -> bool {
		match self {
			Self::Database(sqlx::Error::Database(err)) => err.is_unique_violation(),
			_ => false,
		}
	}
}

/// Result type for tagging operations
pub type Result<T> = std::result::Result<T, TaggableError>;
