//! Storage abstractions consumed by the converters.
//!
//! The pipeline does not own a persistence layer. It talks to one through
//! four narrow traits:
//!
//! - [`ManagerRegistry`]: picks the [`StorageManager`] responsible for a type
//! - [`StorageManager`]: hands out repositories, registers entities and commits
//! - [`Repository`]: looks entities up through a named lookup method
//! - [`Deletable`]: the opt-in deletion capability of a repository
//!
//! # Dyn Compatibility
//!
//! All traits return `Pin<Box<dyn Future>>` instead of using `async fn` so they
//! can be shared as `Arc<dyn Trait>` between request tasks.
//!
//! # Example
//!
//! ```no_run
//! use entity_binding_core::storage::{DeletionContext, ManagerRegistry, StorageError};
//!
//! async fn delete_item(registry: &dyn ManagerRegistry) -> Result<bool, StorageError> {
//!     let manager = registry
//!         .manager_for_type("Item")
//!         .ok_or_else(|| StorageError::UnknownEntityType("Item".to_string()))?;
//!     let repository = manager.repository("Item")?;
//!
//!     let Some(deletable) = repository.as_deletable() else {
//!         return Ok(false);
//!     };
//!
//!     let mut context = DeletionContext::new();
//!     context.set_parameter_name("id").set_parameter_value("42");
//!     deletable.delete_by_request(&context).await
//! }
//! ```

use crate::entity::Entity;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Boxed future returned by storage operations.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Signals raised by the storage layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The requested entity does not exist.
    ///
    /// Carries an optional message. A message means the repository already
    /// described the failure; without one the caller is expected to describe it.
    #[error("{}", .0.as_deref().unwrap_or("Entity not found"))]
    NotFound(Option<String>),

    /// Optimistic concurrency conflict: the entity changed since it was read.
    #[error("{0}")]
    OptimisticLock(String),

    /// The repository has no lookup method with this name.
    #[error("Repository for \"{entity_type}\" has no lookup method \"{method}\"")]
    UnknownLookup {
        /// Entity type the repository serves.
        entity_type: String,
        /// Requested lookup method.
        method: String,
    },

    /// The manager has no repository for this entity type.
    #[error("No repository registered for entity type \"{0}\"")]
    UnknownEntityType(String),

    /// Any other failure of the underlying store.
    #[error("{0}")]
    Backend(String),
}

impl StorageError {
    /// Whether this is an optimistic-lock conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::OptimisticLock(_))
    }

    /// Whether this signals a missing entity.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Message attached to a not-found signal, if it carries a non-empty one.
    #[must_use]
    pub fn not_found_message(&self) -> Option<&str> {
        match self {
            Self::NotFound(Some(message)) if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Lookup parameters handed to [`Deletable::delete_by_request`].
///
/// Built fresh for every deletion attempt and never shared between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionContext {
    parameter_name: String,
    parameter_value: String,
}

impl DeletionContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name of the request parameter identifying the entity.
    pub fn set_parameter_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.parameter_name = name.into();
        self
    }

    /// Set the value of the request parameter identifying the entity.
    pub fn set_parameter_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.parameter_value = value.into();
        self
    }

    /// Name of the request parameter.
    #[must_use]
    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    /// Value of the request parameter.
    #[must_use]
    pub fn parameter_value(&self) -> &str {
        &self.parameter_value
    }
}

/// Repository for one entity type.
pub trait Repository: Send + Sync {
    /// Entity type served by this repository.
    fn entity_type(&self) -> &str;

    /// Look up a single entity through the named lookup method.
    ///
    /// Returns `Ok(None)` when nothing matches the key.
    ///
    /// # Errors
    ///
    /// - `UnknownLookup`: the repository does not provide `method`
    /// - `Backend`: the query failed
    fn lookup<'a>(&'a self, method: &'a str, key: &'a str) -> StorageFuture<'a, Option<Entity>>;

    /// Deletion capability, if this repository opts into it.
    fn as_deletable(&self) -> Option<&dyn Deletable> {
        None
    }
}

/// Deletion capability of a repository.
pub trait Deletable: Send + Sync {
    /// Delete the entity described by `context`.
    ///
    /// Returns `Ok(false)` when the deletion ran but removed nothing.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no entity matches the context
    /// - `OptimisticLock`: concurrent modification detected
    /// - `Backend`: the store failed
    fn delete_by_request<'a>(&'a self, context: &'a DeletionContext) -> StorageFuture<'a, bool>;
}

/// Unit of work over a set of repositories.
pub trait StorageManager: Send + Sync {
    /// Repository for an entity type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` if the manager does not handle the type.
    fn repository(&self, entity_type: &str) -> Result<Arc<dyn Repository>, StorageError>;

    /// Register an entity for persistence. The manager may assign identity fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity cannot be managed.
    fn persist<'a>(&'a self, entity: &'a mut Entity) -> StorageFuture<'a, ()>;

    /// Commit every registered change.
    ///
    /// # Errors
    ///
    /// - `OptimisticLock`: concurrent modification detected
    /// - `Backend`: the commit failed
    fn flush(&self) -> StorageFuture<'_, ()>;
}

/// Resolves storage managers by name or by entity type.
pub trait ManagerRegistry: Send + Sync {
    /// Manager registered under `name`.
    fn manager(&self, name: &str) -> Option<Arc<dyn StorageManager>>;

    /// Manager responsible for `entity_type`.
    fn manager_for_type(&self, entity_type: &str) -> Option<Arc<dyn StorageManager>>;
}
