//! Axum integration for the entity binding converters.
//!
//! A [`ParamConverterLayer`] sits in front of a route handler. It turns the
//! incoming request into a converter request, runs the converter chain and
//! hands the bound entity (or the response marker of a deletion) to the
//! handler through the [`BoundAttributes`] extractor.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** reaches the route's converter layer
//! 2. **Path params and body** become the converter request
//! 3. **Converters** look up, bind, validate and persist (or delete)
//! 4. **Failures** are mapped to HTTP responses via [`AppError`]
//! 5. **Handler** reads [`BoundAttributes`] and renders the result
//!
//! # Example
//!
//! ```ignore
//! use axum::{routing::post, Router};
//! use entity_binding_core::ConverterConfiguration;
//! use entity_binding_web::{bound_response, BoundAttributes, ConverterState};
//!
//! async fn create_item(attributes: BoundAttributes) -> Response {
//!     bound_response(&attributes, "item")
//! }
//!
//! let state = ConverterState::new(forms, registry);
//! let app = Router::new().route(
//!     "/items",
//!     post(create_item).layer(state.layer(ConverterConfiguration::update("item").with_type("ItemType"))),
//! );
//! ```

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::BoundAttributes;
pub use handlers::bound_response;
pub use middleware::{ParamConverterLayer, ParamConverterMiddleware, DEFAULT_BODY_LIMIT};
pub use state::ConverterState;
