//! The request as seen by a converter.
//!
//! The web layer translates the framework's request into a
//! [`ConverterRequest`]: the HTTP method, the resolved route attributes and
//! the decoded body. Converters publish their results back into the same
//! attribute map.

use crate::entity::Entity;
use http::{Method, StatusCode};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A value stored in the request attribute map.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// A raw attribute resolved by routing (path parameter).
    Param(String),
    /// An entity published by a converter.
    Entity(Entity),
    /// A response published by a converter for the downstream handler to return.
    Response(StatusCode),
}

/// Request attributes keyed by name.
pub type Attributes = HashMap<String, Attribute>;

/// Request context handed to converters.
#[derive(Debug, Clone)]
pub struct ConverterRequest {
    method: Method,
    attributes: Attributes,
    body: Map<String, Value>,
}

impl ConverterRequest {
    /// Create a request with no attributes and an empty body.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            attributes: Attributes::new(),
            body: Map::new(),
        }
    }

    /// Add a routing parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into(), Attribute::Param(value.into()));
        self
    }

    /// Replace the body data.
    #[must_use]
    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = body;
        self
    }

    /// HTTP method of the request.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Whether the request uses the given method.
    #[must_use]
    pub fn is_method(&self, method: &Method) -> bool {
        self.method == *method
    }

    /// Decoded body data.
    #[must_use]
    pub const fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Any attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// A routing parameter by name. Published entities and responses are not parameters.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name) {
            Some(Attribute::Param(value)) => Some(value),
            _ => None,
        }
    }

    /// Publish an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.attributes.insert(name.into(), attribute);
    }

    /// All attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Consume the request, keeping its attributes.
    #[must_use]
    pub fn into_attributes(self) -> Attributes {
        self.attributes
    }
}
