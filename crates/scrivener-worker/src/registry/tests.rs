//! Unit tests for the method registry.

use rstest::{fixture, rstest};
use serde::Deserialize;
use serde_json::{Value, json};

use super::*;

#[derive(Deserialize)]
struct AddParams {
    a: i64,
    b: i64,
}

struct Constant(&'static str);

impl Handler for Constant {
    fn call(&self, _params: &Params) -> Result<Value, HandlerError> {
        Ok(Value::from(self.0))
    }
}

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object params, got {other}"),
    }
}

#[fixture]
fn registry() -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry.register_fn("add", "Adds two integers", |p: AddParams| {
        Ok::<_, HandlerError>(p.a + p.b)
    });
    registry.register("ping", "Answers pong", Constant("pong"));
    registry
}

#[test]
fn new_registry_is_empty() {
    let registry = MethodRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[rstest]
fn typed_handler_binds_named_params(registry: MethodRegistry) {
    let handler = registry.get("add").expect("add registered");
    let result = handler.call(&params(json!({"a": 2, "b": 3})));
    assert_eq!(result, Ok(json!(5)));
}

#[rstest]
#[case::missing_field(json!({"a": 2}))]
#[case::wrong_type(json!({"a": "two", "b": 3}))]
fn typed_handler_rejects_mismatched_params(registry: MethodRegistry, #[case] raw: Value) {
    let handler = registry.get("add").expect("add registered");
    let error = handler.call(&params(raw)).expect_err("params should not bind");
    assert!(
        matches!(error, HandlerError::InvalidParams { .. }),
        "expected InvalidParams, got {error:?}"
    );
}

#[rstest]
fn second_registration_replaces_first(mut registry: MethodRegistry) {
    registry.register("ping", "Answers pong loudly", Constant("PONG"));
    assert_eq!(registry.len(), 2);
    let handler = registry.get("ping").expect("ping registered");
    assert_eq!(handler.call(&Params::new()), Ok(json!("PONG")));
    let description = registry
        .methods()
        .find(|info| info.name() == "ping")
        .map(|info| info.description());
    assert_eq!(description, Some("Answers pong loudly"));
}

#[rstest]
fn methods_are_listed_by_name(registry: MethodRegistry) {
    let names: Vec<&str> = registry.methods().map(|info| info.name()).collect();
    assert_eq!(names, vec!["add", "ping"]);
}

#[rstest]
fn unknown_method_is_absent(registry: MethodRegistry) {
    assert!(registry.get("subtract").is_none());
}

#[test]
fn async_handler_is_driven_to_completion() {
    let mut registry = MethodRegistry::new();
    registry.register_async("later", "Resolves a future", |p: AddParams| async move {
        Ok::<_, HandlerError>(p.a * p.b)
    });
    let handler = registry.get("later").expect("later registered");
    assert_eq!(
        handler.call(&params(json!({"a": 4, "b": 5}))),
        Ok(json!(20))
    );
}

#[test]
fn debug_output_lists_method_names() {
    let mut registry = MethodRegistry::new();
    registry.register("ping", "Answers pong", Constant("pong"));
    let rendered = format!("{registry:?}");
    assert!(rendered.contains("ping"), "unexpected debug output: {rendered}");
}
