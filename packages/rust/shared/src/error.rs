//! Error types for itemenrich.
//!
//! Library crates use [`ItemEnrichError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all itemenrich operations.
#[derive(Debug, thiserror::Error)]
pub enum ItemEnrichError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure: connect, send, or body read.
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    /// JSON parsing or serialization error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unusable lookup key, bad URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ItemEnrichError>;

impl ItemEnrichError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ItemEnrichError::config("namespaces URL is required");
        assert_eq!(err.to_string(), "config error: namespaces URL is required");

        let err = ItemEnrichError::Http {
            url: "http://items.local/1/metadata".into(),
            status: 500,
        };
        assert_eq!(err.to_string(), "HTTP 500 from http://items.local/1/metadata");

        let err = ItemEnrichError::validation("record has no usable `id`");
        assert!(err.to_string().contains("usable `id`"));
    }

    #[test]
    fn io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = ItemEnrichError::io("/tmp/records.json", source);
        assert!(err.to_string().contains("/tmp/records.json"));
        assert!(err.to_string().contains("missing"));
    }
}
