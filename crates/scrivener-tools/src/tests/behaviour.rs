//! Behaviour-driven tests for the text tool worker.

use std::io::Cursor;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use crate::backend::{BackendError, TextBackend, UnconfiguredBackend};
use crate::handlers::build_registry;

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

/// Backend that answers every call with a fixed summary wrapped in chatter.
struct CannedSummary {
    summary: String,
}

impl TextBackend for CannedSummary {
    fn complete(&self, _instructions: &str, _text: &str) -> Result<String, BackendError> {
        let body = json!({ "summary": self.summary, "key_points": ["one"] });
        Ok(format!("Here it is: {body} Bye."))
    }
}

#[derive(Default)]
struct TestWorld {
    backend: Option<Arc<dyn TextBackend>>,
    response: Option<Value>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

fn response(world: &TestWorld) -> &Value {
    world.response.as_ref().expect("no response captured")
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a tool worker without a text backend")]
fn given_no_backend(world: &mut TestWorld) {
    world.backend = Some(Arc::new(UnconfiguredBackend));
}

#[given("a tool worker whose backend summarises as {summary}")]
fn given_summary_backend(world: &mut TestWorld, summary: String) {
    world.backend = Some(Arc::new(CannedSummary {
        summary: summary.trim_matches('"').to_owned(),
    }));
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the tool worker serves method {method} with text {text}")]
fn when_served(world: &mut TestWorld, method: String, text: String) {
    let backend = world.backend.take().expect("backend configured");
    let registry = build_registry(backend);
    let line = json!({
        "protocol_version": "2.0",
        "id": 1,
        "method": method.trim_matches('"'),
        "params": {"text": text.trim_matches('"')}
    });
    let mut input = Cursor::new(format!("{line}\n").into_bytes());
    let mut output = Vec::new();
    scrivener_worker::serve(&registry, &mut input, &mut output).expect("serve succeeds");
    let written = String::from_utf8(output).expect("utf-8 output");
    world.response = Some(serde_json::from_str(written.trim()).expect("response is JSON"));
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the tool result is {text}")]
fn then_result(world: &mut TestWorld, text: String) {
    assert_eq!(response(world)["result"], json!(text.trim_matches('"')));
}

#[then("the tool result field {field} is {text}")]
fn then_result_field(world: &mut TestWorld, field: String, text: String) {
    let result = &response(world)["result"];
    assert_eq!(result[field.trim_matches('"')], json!(text.trim_matches('"')));
}

#[then("the tool error code is {code}")]
fn then_error_code(world: &mut TestWorld, code: i64) {
    assert_eq!(response(world)["error"]["code"], json!(code));
}

#[then("the tool error message mentions {fragment}")]
fn then_error_message(world: &mut TestWorld, fragment: String) {
    let message = response(world)["error"]["message"]
        .as_str()
        .expect("error message is a string");
    assert!(
        message.contains(fragment.trim_matches('"')),
        "unexpected message: {message}"
    );
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/tools.feature",
    name = "Echo returns the text unchanged"
)]
fn echo_behaviour(world: TestWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/tools.feature", name = "Text tools need a backend")]
fn unconfigured_backend_behaviour(world: TestWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/tools.feature", name = "Blank text is rejected")]
fn blank_text_behaviour(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/tools.feature",
    name = "Summary is taken from the backend reply"
)]
fn summary_behaviour(world: TestWorld) {
    let _ = world;
}
