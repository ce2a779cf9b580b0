//! Delete converter.
//!
//! Removes the entity named by a request attribute through the repository's
//! [`Deletable`](crate::storage::Deletable) capability and publishes a
//! `204 No Content` response under [`RESPONSE_ATTRIBUTE`].
//!
//! Storage failures are normalized:
//!
//! - not-found without a message becomes a descriptive `EntityNotFound`,
//!   one with a message passes through
//! - lock conflicts and other storage failures become `Deletion` errors
//! - a deletion that removed nothing (`Ok(false)`) is a `Deletion` error

use crate::config::{ConverterConfiguration, ConverterKind, RESPONSE_ATTRIBUTE};
use crate::converter::{resolve_manager, ConverterFuture, ParamConverter};
use crate::error::{ConverterError, Result};
use crate::request::{Attribute, ConverterRequest};
use crate::storage::{DeletionContext, ManagerRegistry, StorageError};
use http::StatusCode;
use std::sync::Arc;
use tracing::Instrument;

/// Converter deleting the entity named by a request attribute.
#[derive(Clone, Default)]
pub struct DeleteConverter {
    registry: Option<Arc<dyn ManagerRegistry>>,
}

impl DeleteConverter {
    /// Converter without a manager registry; it supports nothing until one is wired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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
        let Some(entity) = configuration.entity() else {
            return Err(ConverterError::configuration(
                "You have to specify \"entity\" option for the DeleteConverter.",
            ));
        };

        let param_name = configuration.request_param_name();
        let Some(param_value) = request.param(param_name) else {
            return Err(ConverterError::configuration(format!(
                "\"{param_name}\" is missing from the Request attributes but is required for the DeleteConverter. \
                 It defaults to \"id\" but may be changed via the \"requestParam\" option"
            )));
        };

        let registry = self.registry.as_deref().ok_or_else(|| {
            ConverterError::configuration("The DeleteConverter requires a storage manager registry.")
        })?;

        let target = DeletionTarget {
            entity,
            param_name,
            param_value,
        };
        target
            .delete(registry, configuration.entity_manager())
            .await?;

        tracing::info!(entity, param = param_name, value = param_value, "Entity deleted");
        metrics::counter!("param_converter.delete.completed").increment(1);

        request.set_attribute(
            RESPONSE_ATTRIBUTE,
            Attribute::Response(StatusCode::NO_CONTENT),
        );

        Ok(true)
    }
}

/// Entity type and lookup parameter of one deletion attempt.
struct DeletionTarget<'a> {
    entity: &'a str,
    param_name: &'a str,
    param_value: &'a str,
}

impl DeletionTarget<'_> {
    async fn delete(&self, registry: &dyn ManagerRegistry, manager: Option<&str>) -> Result<()> {
        let manager = resolve_manager(registry, manager, self.entity)?;
        let repository = manager
            .repository(self.entity)
            .map_err(|e| ConverterError::configuration(e.to_string()))?;

        let Some(deletable) = repository.as_deletable() else {
            return Err(ConverterError::configuration(format!(
                "Repository for entity \"{}\" does not implement the Deletable capability.",
                self.entity
            )));
        };

        let mut context = DeletionContext::new();
        context
            .set_parameter_name(self.param_name)
            .set_parameter_value(self.param_value);

        match deletable.delete_by_request(&context).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ConverterError::Deletion {
                message: format!(
                    "Unable to delete Entity of class {} with {} \"{}\".",
                    self.entity, self.param_name, self.param_value
                ),
                source: None,
            }),
            Err(e) => Err(self.normalize(e)),
        }
    }

    fn normalize(&self, error: StorageError) -> ConverterError {
        if !error.is_not_found() {
            return ConverterError::deletion(error);
        }

        let message = error.not_found_message().map_or_else(
            || {
                format!(
                    "Unable to find Entity of class {} with {} \"{}\" for deletion.",
                    self.entity, self.param_name, self.param_value
                )
            },
            str::to_string,
        );

        ConverterError::EntityNotFound {
            message,
            source: Some(error),
        }
    }
}

impl ParamConverter for DeleteConverter {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn supports(&self, configuration: &ConverterConfiguration) -> bool {
        configuration.kind == ConverterKind::Delete && self.registry.is_some()
    }

    fn apply<'a>(
        &'a self,
        request: &'a mut ConverterRequest,
        configuration: &'a ConverterConfiguration,
    ) -> ConverterFuture<'a> {
        let span = tracing::info_span!("delete_converter", name = %configuration.name);

        Box::pin(
            async move {
                let result = self.run(request, configuration).await;
                if let Err(e) = &result {
                    tracing::warn!(kind = e.kind(), error = %e, "Deletion failed");
                    metrics::counter!("param_converter.failed", "converter" => "delete", "kind" => e.kind())
                        .increment(1);
                }
                result
            }
            .instrument(span),
        )
    }
}
