//! Error types for the kubegather library.
//!
//! This module provides the error hierarchy for every operation in the
//! library, using `thiserror` for ergonomic error handling. Each variant
//! carries the identifier (label, path or URL) that caused the failure.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a kubegather error.
///
/// # Examples
///
/// ```
/// use kubegather::{Error, Result};
///
/// fn example_operation() -> Result<String> {
///     Ok("prod@site-a".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the kubegather library.
#[derive(Debug, Error)]
pub enum Error {
    /// The source document lacks a current context, or the current context
    /// references a cluster or identity that does not exist.
    #[error("malformed source document for label '{label}': {reason}")]
    MalformedSourceDocument {
        /// Label of the source being merged.
        label: String,
        /// What is missing or dangling.
        reason: String,
    },

    /// A cluster server address could not be parsed or rewritten.
    #[error("address resolution failed for '{url}': {reason}")]
    AddressResolution {
        /// The server URL that could not be resolved.
        url: String,
        /// The reason resolution failed.
        reason: String,
    },

    /// A private key could not be read or parsed.
    #[error("unable to load private key {}: {reason}", path.display())]
    CredentialLoad {
        /// Path of the key file.
        path: PathBuf,
        /// The reason the key is unusable.
        reason: String,
    },

    /// The label does not exist in the catalog.
    #[error("label '{label}' not found in catalog")]
    LabelNotFound {
        /// The missing label.
        label: String,
    },

    /// No context with this exact name exists in the destination document.
    #[error("context '{name}' not found in destination")]
    ContextNotFound {
        /// The missing context name.
        name: String,
    },

    /// A document could not be serialized or written.
    #[error("unable to write {}: {reason}", path.display())]
    DocumentWrite {
        /// Target path of the write.
        path: PathBuf,
        /// The reason the write failed.
        reason: String,
    },

    /// Raw bytes could not be retrieved from an origin.
    #[error("unable to fetch '{origin}': {reason}")]
    Fetch {
        /// The origin being fetched.
        origin: String,
        /// The reason the fetch failed.
        reason: String,
    },

    /// An origin string could not be interpreted.
    #[error("invalid origin '{origin}': {reason}")]
    InvalidOrigin {
        /// The origin string.
        origin: String,
        /// The reason it is invalid.
        reason: String,
    },

    /// An invalid filesystem path was provided.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
        /// The reason the path is invalid.
        reason: String,
    },

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// Processing one catalog source failed during a gather.
    #[error("source '{label}': {source}")]
    Source {
        /// Label of the failing source.
        label: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// A YAML document could not be parsed.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if the error reports a missing catalog label or context.
    ///
    /// # Examples
    ///
    /// ```
    /// use kubegather::Error;
    ///
    /// let err = Error::LabelNotFound { label: "site-a".to_string() };
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            Self::LabelNotFound { .. } | Self::ContextNotFound { .. }
        )
    }

    /// The error with any per-source wrapping removed.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Source { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_source_error() {
        let err = Error::MalformedSourceDocument {
            label: "site-a".to_string(),
            reason: "current context is empty".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("malformed source document"));
        assert!(display.contains("site-a"));
        assert!(display.contains("current context is empty"));
    }

    #[test]
    fn test_address_resolution_error() {
        let err = Error::AddressResolution {
            url: "https://10.0.0.5".to_string(),
            reason: "no port".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("address resolution failed"));
        assert!(display.contains("https://10.0.0.5"));
    }

    #[test]
    fn test_credential_load_error() {
        let err = Error::CredentialLoad {
            path: PathBuf::from("/keys/id_rsa"),
            reason: "not a private key".to_string(),
        };
        let display = format!("{err}").replace(std::path::MAIN_SEPARATOR, "/");
        assert!(display.contains("/keys/id_rsa"));
        assert!(display.contains("not a private key"));
    }

    #[test]
    fn test_not_found_errors() {
        assert!(Error::LabelNotFound {
            label: "x".to_string()
        }
        .is_not_found());
        assert!(Error::ContextNotFound {
            name: "x".to_string()
        }
        .is_not_found());
        assert!(!Error::Validation {
            field: "x".to_string(),
            message: "y".to_string()
        }
        .is_not_found());
    }

    #[test]
    fn test_document_write_error() {
        let err = Error::DocumentWrite {
            path: PathBuf::from("/home/user/.kube/config"),
            reason: "permission denied".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("unable to write"));
        assert!(display.contains("permission denied"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(format!("{err}").contains("I/O error"));
    }

    #[test]
    fn test_source_wrapper_keeps_kind() {
        let err = Error::Source {
            label: "site-a".to_string(),
            source: Box::new(Error::LabelNotFound {
                label: "x".to_string(),
            }),
        };
        assert!(format!("{err}").starts_with("source 'site-a':"));
        assert!(err.is_not_found());
        assert!(matches!(err.root(), Error::LabelNotFound { .. }));
    }
}
