//! Custom Axum extractors.
//!
//! [`BoundAttributes`] hands the attributes published by the converter layer
//! to a handler.
//!
//! # Example
//!
//! ```ignore
//! use entity_binding_web::{bound_response, BoundAttributes};
//!
//! async fn update_item(attributes: BoundAttributes) -> Response {
//!     bound_response(&attributes, "item")
//! }
//! ```

use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use entity_binding_core::config::RESPONSE_ATTRIBUTE;
use entity_binding_core::entity::Entity;
use entity_binding_core::request::{Attribute, Attributes};
use http::StatusCode;

/// Attributes bound by [`ParamConverterLayer`](crate::middleware::ParamConverterLayer).
///
/// Holds the route parameters and everything the converters published.
/// Extraction fails with a 500 when no converter layer ran for the route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundAttributes(pub Attributes);

impl BoundAttributes {
    /// Attribute stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.0.get(name)
    }

    /// Entity published under `name`.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        match self.0.get(name) {
            Some(Attribute::Entity(entity)) => Some(entity),
            _ => None,
        }
    }

    /// Response status published by a converter.
    #[must_use]
    pub fn response(&self) -> Option<StatusCode> {
        match self.0.get(RESPONSE_ATTRIBUTE) {
            Some(Attribute::Response(status)) => Some(*status),
            _ => None,
        }
    }

    /// Add attributes not yet bound; existing entries win.
    pub fn merge(&mut self, other: Attributes) {
        for (name, attribute) in other {
            self.0.entry(name).or_insert(attribute);
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BoundAttributes
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::internal("No param converter layer is installed for this route"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_extracts_from_extensions() {
        let mut attributes = BoundAttributes::default();
        attributes.0.insert(
            RESPONSE_ATTRIBUTE.to_string(),
            Attribute::Response(StatusCode::NO_CONTENT),
        );

        let mut req = Request::builder().body(()).expect("Valid request");
        req.extensions_mut().insert(attributes.clone());

        let (mut parts, ()) = req.into_parts();
        let extracted = BoundAttributes::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(extracted, attributes);
        assert_eq!(extracted.response(), Some(StatusCode::NO_CONTENT));
    }

    #[tokio::test]
    async fn test_missing_layer_is_internal_error() {
        let req = Request::builder().body(()).expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let err = BoundAttributes::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_merge_keeps_existing_entries() {
        let mut attributes = BoundAttributes::default();
        attributes
            .0
            .insert("id".to_string(), Attribute::Param("1".to_string()));

        let mut outer = Attributes::new();
        outer.insert("id".to_string(), Attribute::Param("2".to_string()));
        outer.insert(
            "owner".to_string(),
            Attribute::Entity(Entity::new("User").with_field("id", 7)),
        );
        attributes.merge(outer);

        assert_eq!(attributes.get("id"), Some(&Attribute::Param("1".to_string())));
        assert_eq!(attributes.entity("owner").and_then(|e| e.get("id")).cloned(), Some(7.into()));
    }
}
