//! Binding and validation engine contract.
//!
//! The update converter never maps request data itself. It asks a
//! [`BindingEngine`] for a form built from a schema identifier, seeds the form
//! with the current entity (or none when creating), submits the raw body and
//! reads back validity, errors and the bound entity.

use crate::entity::Entity;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Errors raised while building a form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// No schema is registered under this identifier.
    #[error("Unknown binding schema \"{0}\"")]
    UnknownSchema(String),
}

/// A validation error, attached to a field or to the form as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field the error belongs to; `None` for form-level errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Error attached to a field.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Error attached to the form itself.
    #[must_use]
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => write!(f, "ERROR: {}", self.message),
        }
    }
}

/// Factory for forms, keyed by schema identifier.
pub trait BindingEngine: Send + Sync {
    /// Build a fresh form for `schema`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSchema` if no schema has that identifier.
    fn create(&self, schema: &str) -> Result<Box<dyn BindingForm>, BindingError>;
}

/// A single-use form binding request data onto an entity.
pub trait BindingForm: Send {
    /// Entity type the schema binds to, if it declares one.
    fn data_class(&self) -> Option<&str>;

    /// Seed the form with the entity to update; `None` creates a new one on submit.
    fn set_data(&mut self, entity: Option<Entity>);

    /// Bind raw request data.
    ///
    /// With `clear_missing`, schema fields absent from `data` are cleared;
    /// otherwise they keep their current value.
    fn submit(&mut self, data: &Map<String, Value>, clear_missing: bool);

    /// Whether the form was submitted and has no errors.
    fn is_valid(&self) -> bool;

    /// Collected validation errors.
    fn errors(&self) -> &[FieldError];

    /// Take the bound entity out of the form.
    fn take_data(&mut self) -> Option<Entity>;
}
