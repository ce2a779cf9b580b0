//! Error taxonomy of the binding pipeline.
//!
//! Every failure inside a converter is translated into one [`ConverterError`]
//! kind at the boundary. The web layer maps the kind to an HTTP status; the
//! core never retries and never swallows an error.

use crate::binding::FieldError;
use crate::storage::StorageError;
use thiserror::Error;

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, ConverterError>;

/// Failure of a converter pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConverterError {
    /// Deployment or wiring defect: missing option, schema without data class,
    /// repository without deletion capability, missing request attribute.
    #[error("{0}")]
    Configuration(String),

    /// The lookup key does not resolve to an entity.
    #[error("{message}")]
    EntityNotFound {
        /// Description naming type, parameter and value.
        message: String,
        /// Storage signal that triggered this error.
        #[source]
        source: Option<StorageError>,
    },

    /// Bound data failed validation.
    #[error("{message}")]
    Validation {
        /// All field errors joined into one message.
        message: String,
        /// Individual field errors.
        errors: Vec<FieldError>,
    },

    /// Deletion failed or removed nothing.
    #[error("{message}")]
    Deletion {
        /// Original failure message.
        message: String,
        /// Storage failure that caused this error.
        #[source]
        source: Option<StorageError>,
    },

    /// Lookup, persist or flush failed in the storage layer.
    #[error("{message}")]
    Storage {
        /// Original failure message.
        message: String,
        /// Storage failure that caused this error.
        #[source]
        source: StorageError,
    },
}

impl ConverterError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a not-found error without an underlying storage signal.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::EntityNotFound {
            message: message.into(),
            source: None,
        }
    }

    /// Create a validation error from field errors.
    #[must_use]
    pub fn validation(errors: Vec<FieldError>) -> Self {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Self::Validation { message, errors }
    }

    /// Wrap a storage failure raised during deletion.
    #[must_use]
    pub fn deletion(source: StorageError) -> Self {
        Self::Deletion {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Wrap a storage failure raised outside deletion.
    #[must_use]
    pub fn storage(source: StorageError) -> Self {
        Self::Storage {
            message: source.to_string(),
            source,
        }
    }

    /// Short label of the error kind, used for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::EntityNotFound { .. } => "entity_not_found",
            Self::Validation { .. } => "validation",
            Self::Deletion { .. } => "deletion",
            Self::Storage { .. } => "storage",
        }
    }

    /// Whether the failure was caused by a concurrent modification.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        match self {
            Self::Deletion {
                source: Some(source),
                ..
            }
            | Self::Storage { source, .. } => source.is_conflict(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_joins_errors() {
        let err = ConverterError::validation(vec![
            FieldError::new("name", "This value should not be blank."),
            FieldError::form("This form should not contain extra fields."),
        ]);
        assert_eq!(
            err.to_string(),
            "name: This value should not be blank.\nERROR: This form should not contain extra fields."
        );
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_deletion_keeps_original_message() {
        let err = ConverterError::deletion(StorageError::OptimisticLock("stale version".to_string()));
        assert_eq!(err.to_string(), "stale version");
        assert!(err.is_conflict());
    }

    #[test]
    fn test_backend_failure_is_not_conflict() {
        let err = ConverterError::storage(StorageError::Backend("disk full".to_string()));
        assert!(!err.is_conflict());
        assert_eq!(err.kind(), "storage");
    }
}
