//! Error types for structsync.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using structsync's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while syncing declarations.
#[derive(Error, Debug)]
pub enum Error {
    /// Source or target file missing or unreadable
    #[error("reading file {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input text is not a valid declaration unit
    #[error("parsing {}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Named record type absent from a parsed unit
    #[error("struct {name} not found in {}", path.display())]
    DeclarationNotFound { name: String, path: PathBuf },

    /// Name resolves to a type declaration that is not a struct
    #[error("{name} is not a struct type")]
    NotARecordType { name: String },

    /// Target file could not be written
    #[error("writing file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be deserialized
    #[error("parsing config file {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// Repository acquisition failed
    #[error("cloning {source_name}: {message}")]
    Git {
        source_name: String,
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a read error for `path`.
    pub fn source_read(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::SourceRead {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a parse error at a 1-based line.
    pub fn parse(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::DeclarationNotFound {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a not-a-struct error.
    pub fn not_a_record(name: impl Into<String>) -> Self {
        Self::NotARecordType { name: name.into() }
    }

    /// Create a write error for `path`.
    pub fn write(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a git acquisition error.
    pub fn git(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Git {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::not_found("User", "object/user.go");
        assert_eq!(err.to_string(), "struct User not found in object/user.go");

        let err = Error::parse("user.go", 12, "expected '}'");
        assert_eq!(err.to_string(), "parsing user.go:12: expected '}'");

        let err = Error::not_a_record("Alias");
        assert_eq!(err.to_string(), "Alias is not a struct type");
    }
}
