//! Unit tests for the tool handlers.

use mockall::mock;
use mockall::predicate::{always, eq};
use rstest::rstest;
use scrivener_protocol::{ErrorCode, Params, Request, RequestId};

use super::*;
use crate::backend::{BackendError, UnconfiguredBackend};

mock! {
    Backend {}
    impl TextBackend for Backend {
        fn complete(&self, instructions: &str, text: &str) -> Result<String, BackendError>;
    }
}

fn replying(reply: &'static str) -> MockBackend {
    let mut backend = MockBackend::new();
    backend
        .expect_complete()
        .times(1)
        .returning(move |_, _| Ok(String::from(reply)));
    backend
}

#[test]
fn echo_returns_text_unchanged() {
    let params = EchoParams {
        text: String::from("  spaced  "),
    };
    assert_eq!(echo(params).expect("echo succeeds"), "  spaced  ");
}

#[rstest]
#[case::small(2, 3, 5)]
#[case::negative(-7, 4, -3)]
fn add_sums_operands(#[case] a: i64, #[case] b: i64, #[case] expected: i64) {
    assert_eq!(add(AddParams { a, b }).expect("sum fits"), expected);
}

#[test]
fn add_overflow_is_a_failure() {
    let error = add(AddParams { a: i64::MAX, b: 1 }).expect_err("overflow expected");
    assert!(matches!(error, HandlerError::Failed { .. }));
}

#[test]
fn correct_reads_object_amid_commentary() {
    let backend = replying(
        "Sure! Here you go:\n{\"corrected\": \"hello world\", \"modifications\": [\"helo -> hello\", \" \"]}\nAnything else?",
    );
    let correction = correct(&backend, "helo world").expect("correction succeeds");
    assert_eq!(
        correction,
        Correction {
            corrected_text: String::from("hello world"),
            modifications: vec![String::from("helo -> hello")],
        }
    );
}

#[test]
fn correct_sends_text_to_backend() {
    let mut backend = MockBackend::new();
    backend
        .expect_complete()
        .with(always(), eq("teh cat"))
        .times(1)
        .returning(|_, _| Ok(String::from(r#"{"corrected":"the cat","modifications":[]}"#)));
    let correction = correct(&backend, "teh cat").expect("correction succeeds");
    assert_eq!(correction.corrected_text, "the cat");
    assert!(correction.modifications.is_empty());
}

#[test]
fn correct_keeps_original_when_backend_omits_text() {
    let backend = replying(r#"{"modifications": "none needed"}"#);
    let correction = correct(&backend, "fine text").expect("correction succeeds");
    assert_eq!(correction.corrected_text, "fine text");
    assert_eq!(correction.modifications, vec![String::from("none needed")]);
}

#[test]
fn polish_maps_polished_field() {
    let backend = replying(r#"{"polished": "We hereby confirm.", "modifications": ["tone"]}"#);
    let polished = polish(&backend, "yeah ok").expect("polish succeeds");
    assert_eq!(polished.polished_text, "We hereby confirm.");
    assert_eq!(polished.modifications, vec![String::from("tone")]);
}

#[test]
fn summarize_maps_summary_and_points() {
    let backend = replying(r#"{"summary": "Budget approved.", "key_points": ["budget", "Q3"]}"#);
    let summary = summarize(&backend, "The committee met and...").expect("summary succeeds");
    assert_eq!(summary.summary, "Budget approved.");
    assert_eq!(
        summary.key_points,
        vec![String::from("budget"), String::from("Q3")]
    );
}

#[rstest]
#[case::empty("")]
#[case::blank(" \n\t")]
fn blank_text_is_rejected_before_backend(#[case] text: &str) {
    let mut backend = MockBackend::new();
    backend.expect_complete().never();
    let error = summarize(&backend, text).expect_err("blank text rejected");
    assert!(matches!(error, HandlerError::InvalidParams { .. }));
}

#[test]
fn reply_without_object_is_a_failure_carrying_the_reply() {
    let backend = replying("I cannot help with that.");
    let error = correct(&backend, "text").expect_err("missing object");
    let HandlerError::Failed { data, .. } = error else {
        panic!("expected Failed, got {error:?}");
    };
    assert_eq!(data, Some(json!({ "reply": "I cannot help with that." })));
}

#[test]
fn backend_failure_is_a_failure() {
    let error = polish(&UnconfiguredBackend, "text").expect_err("backend unavailable");
    assert!(error.to_string().contains("not configured"));
}

#[test]
fn registry_exposes_every_tool() {
    let registry = build_registry(Arc::new(UnconfiguredBackend));
    let names: Vec<&str> = registry.methods().map(|info| info.name()).collect();
    assert_eq!(names, ["add", "correct", "echo", "polish", "summarize"]);
}

#[test]
fn registry_maps_missing_params_to_invalid_params() {
    let registry = build_registry(Arc::new(UnconfiguredBackend));
    let request = Request::new(RequestId::from(1), "add", Params::new());
    let response = scrivener_worker::dispatch(&registry, &request);
    let error = response.error_info().expect("error response");
    assert_eq!(error.kind(), Some(ErrorCode::InvalidParams));
}
