//! HTTP request handlers.

pub mod bound;

pub use bound::bound_response;
