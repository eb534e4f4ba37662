//! CLI-specific error types with exit codes.
//!
//! Library errors are wrapped and mapped to exit codes by their kind, with
//! per-source wrapping looked through.

use std::fmt;

use kubegather::Error as LibError;

/// CLI-specific error type with exit code mapping.
#[derive(Debug)]
pub enum CliError {
    /// Library error (wrapped).
    Library(LibError),

    /// Invalid command-line arguments.
    InvalidArguments(String),

    /// I/O error.
    Io(std::io::Error),

    /// Configuration error.
    Config(String),

    /// Semantic failure (e.g., context not found) - exit code 1.
    SemanticFailure(String),
}

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: Semantic failure (label or context not found)
    /// - 4: Invalid arguments
    /// - 5: I/O error
    /// - 6: Other library error
    /// - 7: Configuration error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::SemanticFailure(_) => 1,
            CliError::Library(lib_err) => match lib_err.root() {
                LibError::LabelNotFound { .. } | LibError::ContextNotFound { .. } => 1,
                LibError::Validation { .. } | LibError::InvalidOrigin { .. } => 4,
                LibError::Io(_) => 5,
                LibError::Configuration(_) => 7,
                _ => 6,
            },
            CliError::InvalidArguments(_) => 4,
            CliError::Io(_) => 5,
            CliError::Config(_) => 7,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Library(e) => write!(f, "{e}"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Config(msg) => write!(f, "Configuration error: {msg}"),
            CliError::SemanticFailure(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LibError> for CliError {
    fn from(e: LibError) -> Self {
        CliError::Library(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_semantic() {
        let err = CliError::from(LibError::ContextNotFound {
            name: "prod@site-a".to_string(),
        });
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_wrapped_source_error_uses_inner_kind() {
        let err = CliError::from(LibError::Source {
            label: "site-a".to_string(),
            source: Box::new(LibError::Validation {
                field: "apiaddress".to_string(),
                message: "conflict".to_string(),
            }),
        });
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_other_library_errors() {
        let err = CliError::from(LibError::Fetch {
            origin: "ssh://h/x".to_string(),
            reason: "refused".to_string(),
        });
        assert_eq!(err.exit_code(), 6);
        assert_eq!(CliError::Config("bad".to_string()).exit_code(), 7);
        assert_eq!(CliError::InvalidArguments("bad".to_string()).exit_code(), 4);
    }
}
