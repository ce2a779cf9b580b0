//! # Entity Binding Core
//!
//! Declarative request-to-entity binding.
//!
//! Endpoints that create, update or delete a persisted entity all repeat the
//! same steps: load the entity, bind and validate the body, persist, map the
//! failures. This crate runs those steps as a converter pipeline driven by a
//! small [`ConverterConfiguration`], before the endpoint handler runs.
//!
//! ## Components
//!
//! - **[`UpdateConverter`]**: `POST` creates, `PUT` replaces, `PATCH` merges
//! - **[`DeleteConverter`]**: deletes through the repository's [`Deletable`] capability
//! - **[`ConverterManager`]**: dispatches a configuration to the converter supporting it
//! - **[`SchemaRegistry`]**: declarative binding engine for request bodies
//!
//! Persistence and validation are external collaborators reached through the
//! [`storage`] and [`binding`] traits.
//!
//! ## Example
//!
//! ```ignore
//! use entity_binding_core::*;
//! use std::sync::Arc;
//!
//! let manager = ConverterManager::new()
//!     .with_converter(Arc::new(UpdateConverter::new(forms).with_registry(registry.clone())))
//!     .with_converter(Arc::new(DeleteConverter::new().with_registry(registry)));
//!
//! let mut request = ConverterRequest::new(http::Method::PATCH)
//!     .with_param("id", "42")
//!     .with_body(body);
//! let config = ConverterConfiguration::update("item").with_type("ItemType");
//!
//! manager.apply(&mut request, &config).await?;
//! ```

pub mod binding;
pub mod config;
pub mod converter;
pub mod delete;
pub mod entity;
pub mod error;
pub mod request;
pub mod schema;
pub mod storage;
pub mod update;

pub use binding::{BindingEngine, BindingError, BindingForm, FieldError};
pub use config::{ConverterConfiguration, ConverterKind, ConverterOptions, RESPONSE_ATTRIBUTE};
pub use converter::{ConverterFuture, ConverterManager, ParamConverter};
pub use delete::DeleteConverter;
pub use entity::Entity;
pub use error::{ConverterError, Result};
pub use request::{Attribute, Attributes, ConverterRequest};
pub use schema::{FieldKind, FieldSpec, FormSchema, SchemaRegistry};
pub use storage::{
    Deletable, DeletionContext, ManagerRegistry, Repository, StorageError, StorageFuture,
    StorageManager,
};
pub use update::UpdateConverter;
