//! Declarative schema-driven binding engine.
//!
//! A [`FormSchema`] lists the fields a request may bind onto an entity type.
//! [`SchemaRegistry`] turns registered schemas into forms for the update
//! converter.
//!
//! # Example
//!
//! ```
//! use entity_binding_core::binding::BindingEngine;
//! use entity_binding_core::schema::{FieldSpec, FormSchema, SchemaRegistry};
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::new().with_schema(
//!     FormSchema::new("ItemType")
//!         .data_class("Item")
//!         .field(FieldSpec::string("name").required().max_length(64))
//!         .field(FieldSpec::number("price")),
//! );
//!
//! let mut form = registry.create("ItemType").unwrap();
//! form.set_data(None);
//! form.submit(json!({ "name": "widget", "price": "9.5" }).as_object().unwrap(), true);
//!
//! assert!(form.is_valid());
//! let item = form.take_data().unwrap();
//! assert_eq!(item.get("price"), Some(&json!(9.5)));
//! ```

use crate::binding::{BindingEngine, BindingError, BindingForm, FieldError};
use crate::entity::Entity;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::sync::Arc;

const INVALID_VALUE: &str = "This value is not valid.";
const BLANK_VALUE: &str = "This value should not be blank.";
const EXTRA_FIELDS: &str = "This form should not contain extra fields.";

/// Value type accepted by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// JSON string.
    String,
    /// Whole number; numeric strings are accepted.
    Integer,
    /// Any number; numeric strings are accepted.
    Number,
    /// Boolean; `"true"`, `"false"`, `"1"` and `"0"` are accepted.
    Boolean,
    /// Any JSON value, unchecked.
    Any,
}

/// A field of a form schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    required: bool,
    max_length: Option<usize>,
}

impl FieldSpec {
    /// Field of the given kind, optional and unbounded.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            max_length: None,
        }
    }

    /// String field.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    /// Integer field.
    #[must_use]
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    /// Number field.
    #[must_use]
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    /// Boolean field.
    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// Unchecked field.
    #[must_use]
    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Any)
    }

    /// The bound entity must hold a non-null value for this field.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Maximum length in characters (string fields).
    #[must_use]
    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Convert a submitted value to this field's kind.
    fn coerce(&self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return Some(Value::Null);
        }

        match (self.kind, value) {
            (FieldKind::Any, _)
            | (FieldKind::String, Value::String(_))
            | (FieldKind::Boolean, Value::Bool(_)) => Some(value.clone()),
            (FieldKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                Some(value.clone())
            }
            (FieldKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (FieldKind::Number, Value::Number(_)) => Some(value.clone()),
            (FieldKind::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            (FieldKind::Boolean, Value::String(s)) => match s.as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Constraint checks on the bound value.
    fn validate(&self, value: Option<&Value>) -> Option<FieldError> {
        let value = value.filter(|v| !v.is_null());

        if self.required && value.is_none() {
            return Some(FieldError::new(&self.name, BLANK_VALUE));
        }

        if let (Some(max), Some(Value::String(s))) = (self.max_length, value) {
            if s.chars().count() > max {
                return Some(FieldError::new(
                    &self.name,
                    format!("This value is too long. It should have {max} characters or less."),
                ));
            }
        }

        None
    }
}

/// Declarative description of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    name: String,
    data_class: Option<String>,
    fields: Vec<FieldSpec>,
}

impl FormSchema {
    /// Empty schema with the given identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_class: None,
            fields: Vec::new(),
        }
    }

    /// Entity type the schema binds to.
    #[must_use]
    pub fn data_class(mut self, data_class: impl Into<String>) -> Self {
        self.data_class = Some(data_class.into());
        self
    }

    /// Add a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Schema identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// [`BindingEngine`] backed by registered [`FormSchema`]s.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<FormSchema>>,
}

impl SchemaRegistry {
    /// Registry without schemas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, replacing one with the same identifier.
    #[must_use]
    pub fn with_schema(mut self, schema: FormSchema) -> Self {
        self.register(schema);
        self
    }

    /// Register a schema, replacing one with the same identifier.
    pub fn register(&mut self, schema: FormSchema) {
        self.schemas.insert(schema.name.clone(), Arc::new(schema));
    }
}

impl BindingEngine for SchemaRegistry {
    fn create(&self, schema: &str) -> Result<Box<dyn BindingForm>, BindingError> {
        let schema = self
            .schemas
            .get(schema)
            .cloned()
            .ok_or_else(|| BindingError::UnknownSchema(schema.to_string()))?;

        Ok(Box::new(SchemaForm {
            schema,
            data: None,
            errors: Vec::new(),
            submitted: false,
        }))
    }
}

/// Form instance created by [`SchemaRegistry`].
#[derive(Debug)]
struct SchemaForm {
    schema: Arc<FormSchema>,
    data: Option<Entity>,
    errors: Vec<FieldError>,
    submitted: bool,
}

impl BindingForm for SchemaForm {
    fn data_class(&self) -> Option<&str> {
        self.schema.data_class.as_deref()
    }

    fn set_data(&mut self, entity: Option<Entity>) {
        self.data = entity;
    }

    fn submit(&mut self, data: &Map<String, Value>, clear_missing: bool) {
        self.submitted = true;
        self.errors.clear();

        let entity_type = self.schema.data_class.clone().unwrap_or_default();
        let entity = self.data.get_or_insert_with(|| Entity::new(entity_type));

        if data.keys().any(|key| self.schema.spec(key).is_none()) {
            self.errors.push(FieldError::form(EXTRA_FIELDS));
        }

        for spec in &self.schema.fields {
            match data.get(&spec.name) {
                Some(raw) => match spec.coerce(raw) {
                    Some(value) => {
                        entity.set(spec.name.clone(), value);
                    }
                    None => self.errors.push(FieldError::new(&spec.name, INVALID_VALUE)),
                },
                None if clear_missing => {
                    entity.set(spec.name.clone(), Value::Null);
                }
                None => {}
            }
        }

        for spec in &self.schema.fields {
            let already_invalid = self
                .errors
                .iter()
                .any(|e| e.field.as_deref() == Some(spec.name.as_str()));
            if already_invalid {
                continue;
            }
            if let Some(error) = spec.validate(entity.get(&spec.name)) {
                self.errors.push(error);
            }
        }
    }

    fn is_valid(&self) -> bool {
        self.submitted && self.errors.is_empty()
    }

    fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    fn take_data(&mut self) -> Option<Entity> {
        self.data.take()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new().with_schema(
            FormSchema::new("ItemType")
                .data_class("Item")
                .field(FieldSpec::string("name").required().max_length(8))
                .field(FieldSpec::string("description"))
                .field(FieldSpec::integer("stock"))
                .field(FieldSpec::boolean("active")),
        )
    }

    fn body(value: &Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_unknown_schema() {
        let err = registry().create("Missing").err();
        assert_eq!(err, Some(BindingError::UnknownSchema("Missing".to_string())));
    }

    #[test]
    fn test_creates_entity_of_data_class() {
        let mut form = registry().create("ItemType").unwrap();
        assert_eq!(form.data_class(), Some("Item"));

        form.set_data(None);
        form.submit(&body(&json!({ "name": "widget", "stock": "3", "active": "1" })), true);

        assert!(form.is_valid());
        let entity = form.take_data().unwrap();
        assert_eq!(entity.entity_type(), "Item");
        assert_eq!(entity.get("stock"), Some(&json!(3)));
        assert_eq!(entity.get("active"), Some(&json!(true)));
        assert_eq!(entity.get("description"), Some(&Value::Null));
    }

    #[test]
    fn test_partial_submit_keeps_missing_fields() {
        let existing = Entity::new("Item")
            .with_field("id", 1)
            .with_field("name", "widget")
            .with_field("description", "blue");

        let mut form = registry().create("ItemType").unwrap();
        form.set_data(Some(existing));
        form.submit(&body(&json!({ "stock": 5 })), false);

        assert!(form.is_valid());
        let entity = form.take_data().unwrap();
        assert_eq!(entity.get("description"), Some(&json!("blue")));
        assert_eq!(entity.get("stock"), Some(&json!(5)));
        assert_eq!(entity.get("id"), Some(&json!(1)));
    }

    #[test]
    fn test_full_submit_clears_missing_fields() {
        let existing = Entity::new("Item")
            .with_field("name", "widget")
            .with_field("description", "blue");

        let mut form = registry().create("ItemType").unwrap();
        form.set_data(Some(existing));
        form.submit(&body(&json!({ "name": "widget" })), true);

        assert!(form.is_valid());
        let entity = form.take_data().unwrap();
        assert_eq!(entity.get("description"), Some(&Value::Null));
    }

    #[test]
    fn test_collects_errors() {
        let mut form = registry().create("ItemType").unwrap();
        form.set_data(None);
        form.submit(
            &body(&json!({ "stock": "many", "active": "maybe", "color": "red" })),
            true,
        );

        assert!(!form.is_valid());
        let errors = form.errors();
        assert!(errors.contains(&FieldError::form(EXTRA_FIELDS)));
        assert!(errors.contains(&FieldError::new("stock", INVALID_VALUE)));
        assert!(errors.contains(&FieldError::new("active", INVALID_VALUE)));
        assert!(errors.contains(&FieldError::new("name", BLANK_VALUE)));
    }

    #[test]
    fn test_max_length() {
        let mut form = registry().create("ItemType").unwrap();
        form.set_data(None);
        form.submit(&body(&json!({ "name": "much too long" })), true);

        assert_eq!(
            form.errors(),
            &[FieldError::new(
                "name",
                "This value is too long. It should have 8 characters or less."
            )]
        );
    }

    #[test]
    fn test_not_valid_before_submit() {
        let form = registry().create("ItemType").unwrap();
        assert!(!form.is_valid());
    }
}
