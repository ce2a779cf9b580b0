//! Application state for Axum routers using the converters.

use crate::middleware::{ParamConverterLayer, DEFAULT_BODY_LIMIT};
use entity_binding_core::binding::BindingEngine;
use entity_binding_core::config::ConverterConfiguration;
use entity_binding_core::converter::ConverterManager;
use entity_binding_core::delete::DeleteConverter;
use entity_binding_core::storage::ManagerRegistry;
use entity_binding_core::update::UpdateConverter;
use std::sync::Arc;

/// Converters shared by every route of an application.
///
/// # Examples
///
/// ```ignore
/// let state = ConverterState::new(Arc::new(schemas), registry)
///     .with_body_limit(64 * 1024);
///
/// let app = Router::new().route(
///     "/items/:id",
///     delete(|attributes: BoundAttributes| async move { bound_response(&attributes, "item") })
///         .layer(state.layer(ConverterConfiguration::delete("item").with_entity("Item"))),
/// );
/// ```
#[derive(Clone, Debug)]
pub struct ConverterState {
    converters: ConverterManager,
    body_limit: usize,
}

impl ConverterState {
    /// State with the update and delete converters wired to `registry`.
    #[must_use]
    pub fn new(forms: Arc<dyn BindingEngine>, registry: Arc<dyn ManagerRegistry>) -> Self {
        let converters = ConverterManager::new()
            .with_converter(Arc::new(
                UpdateConverter::new(forms).with_registry(Arc::clone(&registry)),
            ))
            .with_converter(Arc::new(DeleteConverter::new().with_registry(registry)));

        Self::from_converters(converters)
    }

    /// State around a custom converter chain.
    #[must_use]
    pub fn from_converters(converters: ConverterManager) -> Self {
        Self {
            converters,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Maximum number of body bytes buffered per request.
    #[must_use]
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// The converter chain.
    #[must_use]
    pub const fn converters(&self) -> &ConverterManager {
        &self.converters
    }

    /// Layer binding requests through `configuration`.
    #[must_use]
    pub fn layer(&self, configuration: ConverterConfiguration) -> ParamConverterLayer {
        ParamConverterLayer::new(self.converters.clone(), configuration)
            .with_body_limit(self.body_limit)
    }
}
