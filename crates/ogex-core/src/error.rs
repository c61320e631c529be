//! Unified error handling for ogex
//!
//! Every failure in the build → resolve → encode pipeline is unrecoverable
//! for the current export, so one error type covers all crates.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all ogex operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // ==================== Tree Errors ====================

    /// Malformed structure/primitive tree, detected at encode time
    #[error("Malformed tree at {path}: {message}")]
    Build {
        path: String,
        message: String,
    },

    /// A deferred reference whose key never resolved
    #[error("Unresolved reference: {key}")]
    Reference {
        key: String,
    },

    /// A resolved reference pointing at a structure outside the document
    #[error("Dangling reference to structure #{target}")]
    DanglingReference {
        target: u64,
    },

    /// A data type name with no formatter
    #[error("Unknown data type: {name}")]
    UnknownType {
        name: String,
    },

    // ==================== Input Errors ====================

    /// Invalid input data
    #[error("Invalid data: {message}")]
    InvalidData {
        message: String,
    },

    /// Unsupported input format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat {
        format: String,
    },

    /// JSON scene description error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML scene description error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ==================== Configuration Errors ====================

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
    },

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a malformed tree error
    pub fn build(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Build {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unresolved reference error
    pub fn reference(key: impl Into<String>) -> Self {
        Error::Reference { key: key.into() }
    }

    /// Create an unknown data type error
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Error::UnknownType { name: name.into() }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }

    /// Strip `WithContext` wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this is a malformed tree error
    pub fn is_build_error(&self) -> bool {
        matches!(self.root(), Error::Build { .. })
    }

    /// Check if this is a reference error
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self.root(),
            Error::Reference { .. } | Error::DanglingReference { .. }
        )
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self.root(), Error::Io(_) | Error::FileNotFound(_))
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = Error::reference("geometry/Cube");
        let contextualized = err.with_context("while resolving document");

        let message = contextualized.to_string();
        assert!(message.contains("while resolving document"));
        assert!(message.contains("geometry/Cube"));
    }

    #[test]
    fn test_predicates_see_through_context() {
        let err = Error::build("Metric/float", "vector width mismatch").with_context("encoding");
        assert!(err.is_build_error());
        assert!(!err.is_reference_error());

        assert!(Error::DanglingReference { target: 7 }.is_reference_error());
        assert!(Error::FileNotFound(PathBuf::from("/scene.json")).is_io_error());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::unknown_type("quaternion"));
        let with_context = result.context("parsing property");

        let err = with_context.unwrap_err();
        assert!(err.to_string().contains("parsing property"));
        assert!(matches!(err.root(), Error::UnknownType { name } if name == "quaternion"));
    }
}
