//! Opaque domain entities.

use serde::Serialize;
use serde_json::{Map, Value};

/// A domain object owned by the storage layer.
///
/// The pipeline only moves entities between the binding engine and the
/// storage manager; it never looks at the fields. Serializes as the bare
/// field map so downstream handlers can return it as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    #[serde(skip)]
    entity_type: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Entity {
    /// Create an entity of the given type with no fields.
    #[must_use]
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields: Map::new(),
        }
    }

    /// Create an entity from an existing field map.
    #[must_use]
    pub fn from_fields(entity_type: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields,
        }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Type identifier of this entity.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Read a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Write a field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// All fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_as_field_map() {
        let entity = Entity::new("Item").with_field("id", 7).with_field("name", "widget");
        let value = serde_json::to_value(&entity).ok();
        assert_eq!(value, Some(json!({ "id": 7, "name": "widget" })));
    }

    #[test]
    fn test_set_returns_previous() {
        let mut entity = Entity::new("Item").with_field("name", "widget");
        assert_eq!(entity.set("name", "gadget"), Some(json!("widget")));
        assert_eq!(entity.get("name"), Some(&json!("gadget")));
        assert_eq!(entity.entity_type(), "Item");
    }
}
