//! Recording binding engine
//!
//! Wraps any [`BindingEngine`] and records what the converters ask of it:
//! which schemas were built, which entity each form was seeded with and
//! whether missing fields were cleared.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Locks only panic when poisoned

use entity_binding_core::binding::{BindingEngine, BindingError, BindingForm, FieldError};
use entity_binding_core::entity::Entity;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One form submission seen by [`RecordingBindingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct BindingCall {
    /// Schema the form was built from.
    pub schema: String,
    /// Entity the form was seeded with before submission.
    pub initial: Option<Entity>,
    /// Submitted data.
    pub data: Map<String, Value>,
    /// Whether missing fields were cleared.
    pub clear_missing: bool,
}

/// [`BindingEngine`] decorator recording every form creation and submission.
#[derive(Debug)]
pub struct RecordingBindingEngine<E> {
    inner: E,
    created: AtomicUsize,
    calls: Arc<Mutex<Vec<BindingCall>>>,
}

impl<E: BindingEngine> RecordingBindingEngine<E> {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            created: AtomicUsize::new(0),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of forms created.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// All recorded submissions, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<BindingCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Most recent submission.
    #[must_use]
    pub fn last_call(&self) -> Option<BindingCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl<E: BindingEngine> BindingEngine for RecordingBindingEngine<E> {
    fn create(&self, schema: &str) -> Result<Box<dyn BindingForm>, BindingError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.create(schema)?;

        Ok(Box::new(RecordingForm {
            schema: schema.to_string(),
            inner,
            initial: None,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct RecordingForm {
    schema: String,
    inner: Box<dyn BindingForm>,
    initial: Option<Entity>,
    calls: Arc<Mutex<Vec<BindingCall>>>,
}

impl BindingForm for RecordingForm {
    fn data_class(&self) -> Option<&str> {
        self.inner.data_class()
    }

    fn set_data(&mut self, entity: Option<Entity>) {
        self.initial.clone_from(&entity);
        self.inner.set_data(entity);
    }

    fn submit(&mut self, data: &Map<String, Value>, clear_missing: bool) {
        self.calls.lock().unwrap().push(BindingCall {
            schema: self.schema.clone(),
            initial: self.initial.clone(),
            data: data.clone(),
            clear_missing,
        });
        self.inner.submit(data, clear_missing);
    }

    fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    fn errors(&self) -> &[FieldError] {
        self.inner.errors()
    }

    fn take_data(&mut self) -> Option<Entity> {
        self.inner.take_data()
    }
}
