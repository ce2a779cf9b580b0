//! Converter configuration.
//!
//! A [`ConverterConfiguration`] is produced by whatever metadata layer sits in
//! front of the pipeline (route tables, attributes, config files) and is read
//! by exactly one converter per request. It can be built in code with the
//! `with_*` builders or deserialized with serde:
//!
//! ```
//! use entity_binding_core::config::{ConverterConfiguration, ConverterKind};
//!
//! let json = r#"{
//!     "name": "item",
//!     "kind": "update",
//!     "options": { "type": "ItemType", "requestParam": "item_name" }
//! }"#;
//! let config: ConverterConfiguration = serde_json::from_str(json).unwrap();
//!
//! assert_eq!(config.kind, ConverterKind::Update);
//! assert_eq!(config.request_param_name(), "item_name");
//! assert_eq!(config.find_method_name(), "find");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lookup method invoked on a repository when none is configured.
pub const DEFAULT_FIND_METHOD: &str = "find";

/// Request attribute supplying the lookup key when none is configured.
pub const DEFAULT_REQUEST_PARAM: &str = "id";

/// Attribute key under which the delete converter publishes its response.
pub const RESPONSE_ATTRIBUTE: &str = "response";

/// Which converter a configuration is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterKind {
    /// Create (`POST`) or update (`PUT`/`PATCH`) an entity from the request body.
    Update,
    /// Delete the entity identified by a request attribute.
    Delete,
}

impl fmt::Display for ConverterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => f.write_str("update"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Options carried by a converter configuration.
///
/// Field names follow the camelCase keys used by route metadata
/// (`type`, `entity`, `entityManager`, `repositoryFindMethodName`, `requestParam`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConverterOptions {
    /// Binding schema identifier. Its data class is the entity type (update only).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub form_type: Option<String>,

    /// Entity type identifier (delete only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,

    /// Name of a non-default storage manager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_manager: Option<String>,

    /// Repository lookup method. Defaults to [`DEFAULT_FIND_METHOD`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_find_method_name: Option<String>,

    /// Request attribute holding the lookup key. Defaults to [`DEFAULT_REQUEST_PARAM`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_param: Option<String>,
}

/// Configuration for a single converter invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfiguration {
    /// Attribute key under which the resolved entity is published.
    pub name: String,

    /// Converter this configuration targets.
    pub kind: ConverterKind,

    /// Converter options.
    #[serde(default)]
    pub options: ConverterOptions,
}

impl ConverterConfiguration {
    /// Create a configuration with no options.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ConverterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            options: ConverterOptions::default(),
        }
    }

    /// Create an update configuration.
    #[must_use]
    pub fn update(name: impl Into<String>) -> Self {
        Self::new(name, ConverterKind::Update)
    }

    /// Create a delete configuration.
    #[must_use]
    pub fn delete(name: impl Into<String>) -> Self {
        Self::new(name, ConverterKind::Delete)
    }

    /// Set the binding schema (`type` option).
    #[must_use]
    pub fn with_type(mut self, form_type: impl Into<String>) -> Self {
        self.options.form_type = Some(form_type.into());
        self
    }

    /// Set the entity type (`entity` option).
    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.options.entity = Some(entity.into());
        self
    }

    /// Select a named storage manager.
    #[must_use]
    pub fn with_entity_manager(mut self, manager: impl Into<String>) -> Self {
        self.options.entity_manager = Some(manager.into());
        self
    }

    /// Override the repository lookup method.
    #[must_use]
    pub fn with_find_method(mut self, method: impl Into<String>) -> Self {
        self.options.repository_find_method_name = Some(method.into());
        self
    }

    /// Override the request attribute holding the lookup key.
    #[must_use]
    pub fn with_request_param(mut self, param: impl Into<String>) -> Self {
        self.options.request_param = Some(param.into());
        self
    }

    /// Binding schema identifier, if configured.
    #[must_use]
    pub fn form_type(&self) -> Option<&str> {
        self.options.form_type.as_deref()
    }

    /// Entity type identifier, if configured.
    #[must_use]
    pub fn entity(&self) -> Option<&str> {
        self.options.entity.as_deref()
    }

    /// Configured storage manager name, if any.
    #[must_use]
    pub fn entity_manager(&self) -> Option<&str> {
        self.options.entity_manager.as_deref()
    }

    /// Repository lookup method, falling back to `find`.
    #[must_use]
    pub fn find_method_name(&self) -> &str {
        self.options
            .repository_find_method_name
            .as_deref()
            .unwrap_or(DEFAULT_FIND_METHOD)
    }

    /// Request attribute holding the lookup key, falling back to `id`.
    #[must_use]
    pub fn request_param_name(&self) -> &str {
        self.options
            .request_param
            .as_deref()
            .unwrap_or(DEFAULT_REQUEST_PARAM)
    }
}
