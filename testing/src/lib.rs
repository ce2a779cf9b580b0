//! # Entity Binding Testing
//!
//! Testing utilities for the entity binding pipeline.
//!
//! This crate provides:
//! - In-memory storage collaborators with call recording
//! - A recording decorator for binding engines
//! - Item fixtures wiring both converters
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use entity_binding_testing::{item, BindingFixture};
//!
//! #[tokio::test]
//! async fn test_patch_item() {
//!     let fixture = BindingFixture::with_items([item(1, "widget")]);
//!     let mut request = ConverterRequest::new(Method::PATCH).with_param("id", "1");
//!     let config = ConverterConfiguration::update("item").with_type(ITEM_TYPE);
//!
//!     fixture.converters().apply(&mut request, &config).await.unwrap();
//!     assert_eq!(fixture.manager.flush_count(), 1);
//! }
//! ```

pub mod binding_mocks;
pub mod fixtures;
pub mod storage_mocks;

pub use binding_mocks::{BindingCall, RecordingBindingEngine};
pub use fixtures::{
    item, item_forms, BindingFixture, DEFAULT_MANAGER, ITEM, ITEM_TYPE, LEDGER, ORPHAN_TYPE,
};
pub use storage_mocks::{
    InMemoryManagerRegistry, InMemoryRepository, InMemoryStorageManager, KEY_FIELD,
};

use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber writing through the test harness.
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_wires_both_converters() {
        init_test_tracing();
        let fixture = BindingFixture::with_items([item(1, "widget")]);
        assert_eq!(fixture.converters().len(), 2);
        assert_eq!(fixture.items.len(), 1);
        assert!(fixture.ledger.is_empty());
    }
}
