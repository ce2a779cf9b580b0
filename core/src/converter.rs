//! Converter trait and dispatch.
//!
//! A [`ParamConverter`] runs before the endpoint handler: it reads the
//! request, talks to storage and publishes its result as a request attribute.
//! [`ConverterManager`] picks the converter for a configuration.

use crate::config::ConverterConfiguration;
use crate::error::{ConverterError, Result};
use crate::request::ConverterRequest;
use crate::storage::{ManagerRegistry, StorageManager};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by [`ParamConverter::apply`].
pub type ConverterFuture<'a> = Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;

/// A request-processing step that resolves or mutates an entity.
pub trait ParamConverter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this converter handles `configuration`.
    fn supports(&self, configuration: &ConverterConfiguration) -> bool;

    /// Run the pipeline, publishing the result into `request`.
    ///
    /// Returns `Ok(true)` when the converter handled the request.
    ///
    /// # Errors
    ///
    /// Returns a [`ConverterError`] describing the first failure.
    fn apply<'a>(
        &'a self,
        request: &'a mut ConverterRequest,
        configuration: &'a ConverterConfiguration,
    ) -> ConverterFuture<'a>;
}

/// Ordered set of converters.
#[derive(Clone, Default)]
pub struct ConverterManager {
    converters: Vec<Arc<dyn ParamConverter>>,
}

impl ConverterManager {
    /// Manager without converters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a converter; earlier converters take precedence.
    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn ParamConverter>) -> Self {
        self.converters.push(converter);
        self
    }

    /// Number of registered converters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Whether no converter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Apply the first supporting converter that handles the request.
    ///
    /// # Errors
    ///
    /// - Any error raised by a converter, unchanged
    /// - `Configuration` when no converter handled the configuration
    pub async fn apply(
        &self,
        request: &mut ConverterRequest,
        configuration: &ConverterConfiguration,
    ) -> Result<()> {
        for converter in self.converters.iter().filter(|c| c.supports(configuration)) {
            tracing::debug!(
                converter = converter.name(),
                name = %configuration.name,
                "Applying param converter"
            );

            if converter.apply(request, configuration).await? {
                return Ok(());
            }
        }

        Err(ConverterError::configuration(format!(
            "No param converter handled the {} configuration \"{}\".",
            configuration.kind, configuration.name
        )))
    }
}

impl std::fmt::Debug for ConverterManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterManager")
            .field(
                "converters",
                &self.converters.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Resolve the storage manager for a converter run.
///
/// A configured manager name wins; otherwise the manager responsible for
/// `entity_type` is used.
///
/// # Errors
///
/// Returns `Configuration` when no matching manager is registered.
pub fn resolve_manager(
    registry: &dyn ManagerRegistry,
    name: Option<&str>,
    entity_type: &str,
) -> Result<Arc<dyn StorageManager>> {
    match name {
        Some(name) => registry.manager(name).ok_or_else(|| {
            ConverterError::configuration(format!("No storage manager named \"{name}\" is registered."))
        }),
        None => registry.manager_for_type(entity_type).ok_or_else(|| {
            ConverterError::configuration(format!(
                "No storage manager is registered for entity class {entity_type}."
            ))
        }),
    }
}
