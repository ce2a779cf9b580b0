//! Responses built from bound attributes.

use crate::error::AppError;
use crate::extractors::BoundAttributes;
use axum::{
    response::{IntoResponse, Response},
    Json,
};

/// Render the outcome of a converter layer.
///
/// - A published response status (the delete converter's 204) wins
/// - Otherwise the entity bound under `name` is returned as JSON
/// - Otherwise the route is misconfigured and a 500 is returned
#[must_use]
pub fn bound_response(attributes: &BoundAttributes, name: &str) -> Response {
    if let Some(status) = attributes.response() {
        return status.into_response();
    }

    match attributes.entity(name) {
        Some(entity) => Json(entity).into_response(),
        None => AppError::internal(format!("No entity is bound under \"{name}\"")).into_response(),
    }
}
