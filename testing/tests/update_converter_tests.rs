//! Tests for the create-or-update converter

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect
#![allow(clippy::panic)] // Tests can panic on unexpected shapes

use entity_binding_core::binding::FieldError;
use entity_binding_core::config::ConverterConfiguration;
use entity_binding_core::converter::ParamConverter;
use entity_binding_core::error::ConverterError;
use entity_binding_core::request::{Attribute, ConverterRequest};
use entity_binding_core::storage::StorageError;
use entity_binding_core::update::UpdateConverter;
use entity_binding_testing::{init_test_tracing, item, item_forms, BindingFixture, ITEM_TYPE, ORPHAN_TYPE};
use http::Method;
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn body(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("body must be an object")
}

fn item_config() -> ConverterConfiguration {
    ConverterConfiguration::update("item").with_type(ITEM_TYPE)
}

fn published(request: &ConverterRequest, name: &str) -> entity_binding_core::Entity {
    match request.attribute(name) {
        Some(Attribute::Entity(entity)) => entity.clone(),
        other => panic!("expected entity under {name}, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_type_fails_before_any_call() {
    init_test_tracing();
    let fixture = BindingFixture::new();
    let mut request = ConverterRequest::new(Method::POST).with_body(body(json!({ "name": "x" })));

    let err = fixture
        .update_converter()
        .apply(&mut request, &ConverterConfiguration::update("item"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ConverterError::configuration("You have to specify \"type\" option for the UpdateConverter.")
    );
    assert_eq!(fixture.forms.created_count(), 0);
    assert_eq!(fixture.registry.resolution_count(), 0);
    assert_eq!(fixture.manager.persist_count(), 0);
}

#[tokio::test]
async fn test_schema_without_data_class_is_configuration_error() {
    let fixture = BindingFixture::new();
    let mut request = ConverterRequest::new(Method::POST);
    let config = ConverterConfiguration::update("item").with_type(ORPHAN_TYPE);

    let err = fixture
        .update_converter()
        .apply(&mut request, &config)
        .await
        .unwrap_err();

    assert!(matches!(err, ConverterError::Configuration(_)));
    assert!(err.to_string().contains("\"data_class\""));
    assert_eq!(fixture.registry.resolution_count(), 0);
}

#[tokio::test]
async fn test_unknown_schema_is_configuration_error() {
    let fixture = BindingFixture::new();
    let mut request = ConverterRequest::new(Method::POST);
    let config = ConverterConfiguration::update("item").with_type("NoSuchType");

    let err = fixture
        .update_converter()
        .apply(&mut request, &config)
        .await
        .unwrap_err();

    assert!(matches!(err, ConverterError::Configuration(_)));
}

#[tokio::test]
async fn test_post_creates_and_publishes_entity() {
    init_test_tracing();
    let fixture = BindingFixture::new();
    let mut request = ConverterRequest::new(Method::POST)
        .with_body(body(json!({ "name": "widget", "price": 9.5 })));

    let applied = fixture
        .update_converter()
        .apply(&mut request, &item_config())
        .await
        .unwrap();

    assert!(applied);
    assert_eq!(fixture.manager.persist_count(), 1);
    assert_eq!(fixture.manager.flush_count(), 1);

    let entity = published(&request, "item");
    assert_eq!(entity.entity_type(), "Item");
    assert_eq!(entity.get("id"), Some(&json!(1)));
    assert_eq!(entity.get("name"), Some(&json!("widget")));
    assert_eq!(fixture.items.get("1"), Some(entity));
}

#[tokio::test]
async fn test_post_ignores_lookup_key() {
    let fixture = BindingFixture::with_items([item(1, "widget")]);
    let mut request = ConverterRequest::new(Method::POST)
        .with_param("id", "1")
        .with_body(body(json!({ "name": "gadget" })));

    fixture
        .update_converter()
        .apply(&mut request, &item_config())
        .await
        .unwrap();

    let call = fixture.forms.last_call().unwrap();
    assert_eq!(call.initial, None);
    assert!(call.clear_missing);
    assert!(fixture.items.lookups().is_empty());
    assert_eq!(fixture.items.len(), 2);
    assert_eq!(published(&request, "item").get("id"), Some(&json!(2)));
}

#[tokio::test]
async fn test_patch_missing_entity_names_type_param_and_value() {
    let fixture = BindingFixture::new();
    let mut request = ConverterRequest::new(Method::PATCH)
        .with_param("item_name", "widget")
        .with_body(body(json!({ "price": 1 })));
    let config = item_config().with_request_param("item_name");

    let err = fixture
        .update_converter()
        .apply(&mut request, &config)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ConverterError::not_found("Unable to find Entity of class Item with item_name \"widget\"")
    );
    assert_eq!(fixture.manager.persist_count(), 0);
    assert!(request.attribute("item").is_none());
}

#[tokio::test]
async fn test_patch_leaves_omitted_fields_untouched() {
    let fixture = BindingFixture::with_items([item(1, "widget").with_field("description", "blue")]);
    let mut request = ConverterRequest::new(Method::PATCH)
        .with_param("id", "1")
        .with_body(body(json!({ "price": 3 })));

    fixture
        .update_converter()
        .apply(&mut request, &item_config())
        .await
        .unwrap();

    let call = fixture.forms.last_call().unwrap();
    assert!(!call.clear_missing);
    assert_eq!(call.initial, Some(item(1, "widget").with_field("description", "blue")));

    let stored = fixture.items.get("1").unwrap();
    assert_eq!(stored.get("description"), Some(&json!("blue")));
    assert_eq!(stored.get("name"), Some(&json!("widget")));
    assert_eq!(stored.get("price"), Some(&json!(3)));
    assert_eq!(fixture.manager.persist_count(), 1);
    assert_eq!(fixture.manager.flush_count(), 1);
}

#[tokio::test]
async fn test_put_clears_omitted_fields() {
    let fixture = BindingFixture::with_items([item(1, "widget").with_field("description", "blue")]);
    let mut request = ConverterRequest::new(Method::PUT)
        .with_param("id", "1")
        .with_body(body(json!({ "name": "gadget" })));

    fixture
        .update_converter()
        .apply(&mut request, &item_config())
        .await
        .unwrap();

    assert!(fixture.forms.last_call().unwrap().clear_missing);
    let stored = fixture.items.get("1").unwrap();
    assert_eq!(stored.get("name"), Some(&json!("gadget")));
    assert_eq!(stored.get("description"), Some(&Value::Null));
    assert_eq!(fixture.items.len(), 1);
    assert_eq!(fixture.manager.persist_count(), 1);
    assert_eq!(fixture.manager.flush_count(), 1);
}

#[tokio::test]
async fn test_put_without_request_param_is_configuration_error() {
    let fixture = BindingFixture::with_items([item(1, "widget")]);
    let mut request = ConverterRequest::new(Method::PUT).with_body(body(json!({ "name": "x" })));

    let err = fixture
        .update_converter()
        .apply(&mut request, &item_config())
        .await
        .unwrap_err();

    assert!(matches!(err, ConverterError::Configuration(_)));
    assert!(err.to_string().starts_with("\"id\" is missing from the Request attributes"));
    assert!(fixture.items.lookups().is_empty());
}

#[tokio::test]
async fn test_custom_find_method() {
    let fixture = BindingFixture::with_items([item(7, "widget")]);
    let mut request = ConverterRequest::new(Method::PATCH)
        .with_param("item_name", "widget")
        .with_body(body(json!({ "description": "renamed" })));
    let config = item_config()
        .with_request_param("item_name")
        .with_find_method("findByName");

    fixture
        .update_converter()
        .apply(&mut request, &config)
        .await
        .unwrap();

    assert_eq!(
        fixture.items.lookups(),
        vec![("findByName".to_string(), "widget".to_string())]
    );
    assert_eq!(published(&request, "item").get("id"), Some(&json!(7)));
}

#[tokio::test]
async fn test_unknown_find_method_is_configuration_error() {
    let fixture = BindingFixture::with_items([item(1, "widget")]);
    let mut request = ConverterRequest::new(Method::PATCH).with_param("id", "1");
    let config = item_config().with_find_method("search");

    let err = fixture
        .update_converter()
        .apply(&mut request, &config)
        .await
        .unwrap_err();

    assert!(matches!(err, ConverterError::Configuration(_)));
}

#[tokio::test]
async fn test_validation_failure_persists_nothing() {
    let fixture = BindingFixture::new();
    let mut request = ConverterRequest::new(Method::POST)
        .with_body(body(json!({ "price": "cheap" })));

    let err = fixture
        .update_converter()
        .apply(&mut request, &item_config())
        .await
        .unwrap_err();

    let ConverterError::Validation { errors, .. } = &err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.contains(&FieldError::new("price", "This value is not valid.")));
    assert!(errors.contains(&FieldError::new("name", "This value should not be blank.")));
    assert_eq!(fixture.manager.persist_count(), 0);
    assert_eq!(fixture.manager.flush_count(), 0);
    assert!(fixture.items.is_empty());
}

#[tokio::test]
async fn test_unknown_entity_manager_is_configuration_error() {
    let fixture = BindingFixture::new();
    let mut request = ConverterRequest::new(Method::POST).with_body(body(json!({ "name": "x" })));
    let config = item_config().with_entity_manager("archive");

    let err = fixture
        .update_converter()
        .apply(&mut request, &config)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ConverterError::configuration("No storage manager named \"archive\" is registered.")
    );
    assert_eq!(fixture.manager.persist_count(), 0);
}

#[tokio::test]
async fn test_named_entity_manager_is_used() {
    let fixture = BindingFixture::new();
    let mut request = ConverterRequest::new(Method::POST).with_body(body(json!({ "name": "x" })));
    let config = item_config().with_entity_manager("default");

    fixture
        .update_converter()
        .apply(&mut request, &config)
        .await
        .unwrap();

    assert_eq!(fixture.manager.flush_count(), 1);
}

#[tokio::test]
async fn test_flush_conflict_surfaces_as_storage_conflict() {
    let fixture = BindingFixture::with_items([item(1, "widget")]);
    fixture
        .manager
        .fail_next_flush(StorageError::OptimisticLock("Item 1 changed concurrently".to_string()));
    let mut request = ConverterRequest::new(Method::PATCH)
        .with_param("id", "1")
        .with_body(body(json!({ "name": "gadget" })));

    let err = fixture
        .update_converter()
        .apply(&mut request, &item_config())
        .await
        .unwrap_err();

    assert!(matches!(err, ConverterError::Storage { .. }));
    assert!(err.is_conflict());
    assert_eq!(err.to_string(), "Item 1 changed concurrently");
    assert_eq!(
        fixture.items.get("1").unwrap().get("name"),
        Some(&json!("widget"))
    );
}

#[test]
fn test_supports() {
    let fixture = BindingFixture::new();
    let converter = fixture.update_converter();

    assert!(converter.supports(&item_config()));
    assert!(!converter.supports(&ConverterConfiguration::delete("item").with_entity("Item")));

    let unwired = UpdateConverter::new(Arc::new(item_forms()));
    assert!(!unwired.supports(&item_config()));
}

#[tokio::test]
async fn test_manager_dispatches_by_kind() {
    let fixture = BindingFixture::new();
    let mut request = ConverterRequest::new(Method::POST).with_body(body(json!({ "name": "x" })));

    fixture
        .converters()
        .apply(&mut request, &item_config())
        .await
        .unwrap();

    assert!(matches!(request.attribute("item"), Some(Attribute::Entity(_))));
}

#[tokio::test]
async fn test_manager_without_supporting_converter() {
    let fixture = BindingFixture::new();
    let converters = entity_binding_core::ConverterManager::new()
        .with_converter(Arc::new(fixture.delete_converter()));
    let mut request = ConverterRequest::new(Method::POST);

    let err = converters
        .apply(&mut request, &item_config())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ConverterError::configuration("No param converter handled the update configuration \"item\".")
    );
}
