//! Create-or-update converter.
//!
//! Handles `POST`, `PUT` and `PATCH` for an entity bound through a form schema:
//!
//! 1. `POST` starts from no entity, every other method fetches the entity named
//!    by the configured request parameter
//! 2. The body is bound through the binding engine; `PATCH` leaves omitted
//!    fields untouched, every other method clears them
//! 3. Valid entities are persisted and flushed immediately
//! 4. The entity is published under the configuration name

use crate::binding::{BindingEngine, BindingForm};
use crate::config::{ConverterConfiguration, ConverterKind};
use crate::converter::{resolve_manager, ConverterFuture, ParamConverter};
use crate::entity::Entity;
use crate::error::{ConverterError, Result};
use crate::request::{Attribute, ConverterRequest};
use crate::storage::{ManagerRegistry, StorageError, StorageManager};
use http::Method;
use std::sync::Arc;
use tracing::Instrument;

/// Converter creating or updating an entity from the request body.
#[derive(Clone)]
pub struct UpdateConverter {
    forms: Arc<dyn BindingEngine>,
    registry: Option<Arc<dyn ManagerRegistry>>,
}

impl UpdateConverter {
    /// Converter without a manager registry; it supports nothing until one is wired.
    #[must_use]
    pub fn new(forms: Arc<dyn BindingEngine>) -> Self {
        Self {
            forms,
            registry: None,
        }
    }

    /// Wire the manager registry.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn ManagerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    async fn run(
        &self,
        request: &mut ConverterRequest,
        configuration: &ConverterConfiguration,
    ) -> Result<bool> {
        let Some(form_type) = configuration.form_type() else {
            return Err(ConverterError::configuration(
                "You have to specify \"type\" option for the UpdateConverter.",
            ));
        };

        // The form is created up front to read the data class from it.
        let mut form = self.forms.create(form_type).map_err(|e| {
            ConverterError::configuration(format!("{e} for the UpdateConverter."))
        })?;
        let Some(entity_class) = form.data_class().map(str::to_string) else {
            return Err(ConverterError::configuration(format!(
                "You have to specify \"data_class\" option in \"{form_type}\" for the UpdateConverter."
            )));
        };

        let registry = self.registry.as_deref().ok_or_else(|| {
            ConverterError::configuration("The UpdateConverter requires a storage manager registry.")
        })?;

        let entity = if request.is_method(&Method::POST) {
            None
        } else {
            Some(fetch_entity(registry, request, configuration, &entity_class).await?)
        };

        let mut entity = bind(form.as_mut(), entity, request)?;

        let manager = resolve_manager(registry, configuration.entity_manager(), &entity_class)?;
        manager
            .persist(&mut entity)
            .await
            .map_err(ConverterError::storage)?;
        manager.flush().await.map_err(ConverterError::storage)?;

        tracing::info!(entity_class = %entity_class, "Entity persisted");
        metrics::counter!("param_converter.update.persisted").increment(1);

        request.set_attribute(configuration.name.clone(), Attribute::Entity(entity));

        Ok(true)
    }
}

/// Load the entity named by the configured request parameter.
async fn fetch_entity(
    registry: &dyn ManagerRegistry,
    request: &ConverterRequest,
    configuration: &ConverterConfiguration,
    entity_class: &str,
) -> Result<Entity> {
    let param_name = configuration.request_param_name();
    let Some(param_value) = request.param(param_name) else {
        return Err(ConverterError::configuration(format!(
            "\"{param_name}\" is missing from the Request attributes but is required for the UpdateConverter. \
             It defaults to \"id\" but may be changed via the \"requestParam\" option"
        )));
    };

    let manager = resolve_manager(registry, configuration.entity_manager(), entity_class)?;
    let found = find_in_repository(
        manager.as_ref(),
        entity_class,
        configuration.find_method_name(),
        param_value,
    )
    .await?;

    found.ok_or_else(|| {
        ConverterError::not_found(format!(
            "Unable to find Entity of class {entity_class} with {param_name} \"{param_value}\""
        ))
    })
}

async fn find_in_repository(
    manager: &dyn StorageManager,
    entity_class: &str,
    method: &str,
    key: &str,
) -> Result<Option<Entity>> {
    let repository = manager
        .repository(entity_class)
        .map_err(|e| ConverterError::configuration(e.to_string()))?;

    tracing::debug!(entity_class, method, key, "Looking up entity");

    match repository.lookup(method, key).await {
        Ok(found) => Ok(found),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e @ StorageError::UnknownLookup { .. }) => {
            Err(ConverterError::configuration(e.to_string()))
        }
        Err(e) => Err(ConverterError::storage(e)),
    }
}

/// Bind the request body onto `entity` and validate it.
fn bind(
    form: &mut dyn BindingForm,
    entity: Option<Entity>,
    request: &ConverterRequest,
) -> Result<Entity> {
    form.set_data(entity);

    // PATCH allows partial bodies; every other method clears omitted fields.
    let clear_missing = !request.is_method(&Method::PATCH);
    form.submit(request.body(), clear_missing);

    if !form.is_valid() {
        return Err(ConverterError::validation(form.errors().to_vec()));
    }

    form.take_data().ok_or_else(|| {
        ConverterError::configuration("The binding engine returned no entity for the UpdateConverter.")
    })
}

impl ParamConverter for UpdateConverter {
    fn name(&self) -> &'static str {
        "update"
    }

    fn supports(&self, configuration: &ConverterConfiguration) -> bool {
        configuration.kind == ConverterKind::Update && self.registry.is_some()
    }

    fn apply<'a>(
        &'a self,
        request: &'a mut ConverterRequest,
        configuration: &'a ConverterConfiguration,
    ) -> ConverterFuture<'a> {
        let span = tracing::info_span!(
            "update_converter",
            name = %configuration.name,
            method = %request.method(),
        );

        Box::pin(
            async move {
                let result = self.run(request, configuration).await;
                if let Err(e) = &result {
                    tracing::warn!(kind = e.kind(), error = %e, "Update failed");
                    metrics::counter!("param_converter.failed", "converter" => "update", "kind" => e.kind())
                        .increment(1);
                }
                result
            }
            .instrument(span),
        )
    }
}
