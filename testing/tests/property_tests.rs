//! Property tests for request-method binding semantics

#![allow(clippy::unwrap_used)] // Tests can unwrap

use entity_binding_core::config::ConverterConfiguration;
use entity_binding_core::converter::ParamConverter;
use entity_binding_core::request::ConverterRequest;
use entity_binding_testing::{item, BindingFixture, ITEM_TYPE};
use http::Method;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn item_config() -> ConverterConfiguration {
    ConverterConfiguration::update("item").with_type(ITEM_TYPE)
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{0,20}"
}

fn arb_body() -> impl Strategy<Value = Map<String, Value>> {
    (
        arb_name(),
        proptest::option::of("[a-z]{0,12}"),
        proptest::option::of(0i64..10_000),
    )
        .prop_map(|(name, description, price)| {
            let mut body = Map::new();
            body.insert("name".to_string(), json!(name));
            if let Some(description) = description {
                body.insert("description".to_string(), json!(description));
            }
            if let Some(price) = price {
                body.insert("price".to_string(), json!(price));
            }
            body
        })
}

fn apply(fixture: &BindingFixture, method: Method, key: Option<&str>, body: Map<String, Value>) {
    let mut request = ConverterRequest::new(method).with_body(body);
    if let Some(key) = key {
        request = request.with_param("id", key);
    }
    runtime()
        .block_on(fixture.update_converter().apply(&mut request, &item_config()))
        .unwrap();
}

proptest! {
    #[test]
    fn prop_full_update_is_idempotent(body in arb_body()) {
        let fixture = BindingFixture::with_items([
            item(1, "widget").with_field("description", "blue").with_field("price", 5),
        ]);

        apply(&fixture, Method::PUT, Some("1"), body.clone());
        let first = fixture.items.get("1").unwrap();
        apply(&fixture, Method::PUT, Some("1"), body);
        let second = fixture.items.get("1").unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(fixture.items.len(), 1);
    }

    #[test]
    fn prop_create_never_looks_up(key in proptest::option::of("[0-9]{1,4}"), body in arb_body()) {
        let fixture = BindingFixture::with_items([item(1, "widget")]);

        apply(&fixture, Method::POST, key.as_deref(), body);

        let call = fixture.forms.last_call().unwrap();
        prop_assert!(call.initial.is_none());
        prop_assert!(fixture.items.lookups().is_empty());
        prop_assert_eq!(fixture.items.len(), 2);
    }

    #[test]
    fn prop_omitted_field_depends_on_method(description in "[a-z]{1,12}", name in arb_name()) {
        let seeded = item(1, "widget").with_field("description", description.clone());
        let partial = BindingFixture::with_items([seeded.clone()]);
        let full = BindingFixture::with_items([seeded]);
        let mut body = Map::new();
        body.insert("name".to_string(), json!(name));

        apply(&partial, Method::PATCH, Some("1"), body.clone());
        apply(&full, Method::PUT, Some("1"), body);

        prop_assert_eq!(
            partial.items.get("1").unwrap().get("description").cloned(),
            Some(json!(description))
        );
        prop_assert_eq!(
            full.items.get("1").unwrap().get("description").cloned(),
            Some(Value::Null)
        );
    }
}
