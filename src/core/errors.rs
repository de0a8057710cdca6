//! Error types for merging and font building
//!
//! Library code returns these structured errors. The binary wraps them in
//! `anyhow` with file context the same way the rest of the application does.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, MergeError>;

/// Failures surfaced by a merge or subset run
#[derive(Debug, Error)]
pub enum MergeError {
    /// Inputs are missing or unusable; no work was performed
    #[error("{0}")]
    Validation(String),

    /// Another merge is still running on the same merger
    #[error("a font merge is already in progress")]
    Busy,

    /// A source font could not be parsed
    #[error("failed to read {name}: {reason}")]
    FontLoad { name: String, reason: String },

    /// Assembly or serialization failed even after the reduced-table retry
    #[error("font build failed: {0}")]
    FontBuild(#[from] SerializeError),

    /// Writing the finished font failed
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Failures raised while serializing a font spec to binary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    /// A table the serializer cannot carry into the output
    #[error("unsupported table '{tag}': {reason}")]
    UnsupportedTable { tag: String, reason: String },

    /// A table the font library rejected while encoding
    #[error("invalid table '{tag}': {reason}")]
    InvalidTable { tag: String, reason: String },

    /// A glyph outline that cannot be encoded
    #[error("cannot encode outline of glyph '{glyph}': {reason}")]
    Outline { glyph: String, reason: String },

    /// More glyphs than a TrueType font can address
    #[error("{count} glyphs exceed the TrueType limit of 65535")]
    TooManyGlyphs { count: usize },

    /// The encoded font is implausibly small
    #[error("encoded font is {size} bytes, below the {minimum} byte minimum")]
    TooSmall { size: usize, minimum: usize },
}

impl SerializeError {
    /// Whether a build with fewer tables could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SerializeError::UnsupportedTable { .. } | SerializeError::InvalidTable { .. }
        )
    }

    pub fn unsupported(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedTable {
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid(tag: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidTable {
            tag: tag.into(),
            reason: reason.to_string(),
        }
    }
}
