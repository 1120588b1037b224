//! Unit tests for the invocation client.

use std::ffi::OsString;
use std::time::Duration;

use mockall::mock;
use rstest::{fixture, rstest};
use scrivener_protocol::ErrorCode;
use serde_json::json;

use super::*;
use crate::error::FailureKind;

mock! {
    Launcher {}
    impl WorkerLauncher for Launcher {
        fn launch(
            &self,
            command: &WorkerCommand,
            attempt: &InvocationAttempt,
        ) -> Result<CapturedOutput, InvokeError>;
    }
}

const DEADLINE: Duration = Duration::from_secs(5);

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object params, got {other}"),
    }
}

/// Builds a launcher that answers every attempt with `body` under the
/// attempt's own id.
fn answering(body: &'static str) -> MockLauncher {
    let mut launcher = MockLauncher::new();
    launcher.expect_launch().returning(move |_, attempt| {
        let id = serde_json::to_string(attempt.request().id()).expect("serialise id");
        Ok(CapturedOutput::new(
            Some(0),
            format!("booting\n{{\"protocol_version\":\"2.0\",\"id\":{id},{body}}}\n"),
            "",
        ))
    });
    launcher
}

#[fixture]
fn command() -> WorkerCommand {
    WorkerCommand::new("scrivener-tools")
}

#[rstest]
fn success_returns_result_value(command: WorkerCommand) {
    let client = InvocationClient::with_launcher(command, answering(r#""result":"hello""#));
    let value = client
        .invoke("echo", params(json!({"text": "hello"})), DEADLINE, None)
        .expect("invoke should succeed");
    assert_eq!(value, json!("hello"));
}

#[rstest]
fn tool_error_keeps_worker_error(command: WorkerCommand) {
    let client = InvocationClient::with_launcher(
        command,
        answering(r#""error":{"code":-32601,"message":"method 'nope' not found"}"#),
    );
    let error = client
        .invoke("nope", Params::new(), DEADLINE, None)
        .expect_err("tool error expected");
    let InvokeError::Tool { method, error } = error else {
        panic!("expected Tool error, got {error:?}");
    };
    assert_eq!(method, "nope");
    assert_eq!(error.kind(), Some(ErrorCode::MethodNotFound));
}

#[rstest]
#[case::empty("")]
#[case::blank("  \t ")]
fn blank_method_is_rejected_without_launching(command: WorkerCommand, #[case] method: &str) {
    let mut launcher = MockLauncher::new();
    launcher.expect_launch().never();
    let client = InvocationClient::with_launcher(command, launcher);
    let error = client
        .invoke(method, Params::new(), DEADLINE, None)
        .expect_err("invalid argument expected");
    assert_eq!(error.kind(), FailureKind::InvalidArgument);
}

#[rstest]
fn zero_deadline_is_rejected_without_launching(command: WorkerCommand) {
    let mut launcher = MockLauncher::new();
    launcher.expect_launch().never();
    let client = InvocationClient::with_launcher(command, launcher);
    let error = client
        .invoke("echo", Params::new(), Duration::ZERO, None)
        .expect_err("invalid argument expected");
    assert_eq!(error.kind(), FailureKind::InvalidArgument);
}

#[rstest]
fn method_name_is_trimmed_before_sending(command: WorkerCommand) {
    let mut launcher = MockLauncher::new();
    launcher
        .expect_launch()
        .withf(|_, attempt| attempt.request().method() == "echo")
        .times(1)
        .returning(|_, _| Ok(CapturedOutput::new(Some(0), "", "")));
    let client = InvocationClient::with_launcher(command, launcher);
    let error = client
        .invoke("  echo ", Params::new(), DEADLINE, None)
        .expect_err("empty output is a protocol error");
    assert_eq!(error.kind(), FailureKind::Protocol);
}

#[rstest]
fn nonzero_exit_is_transport_error_with_stderr(command: WorkerCommand) {
    let mut launcher = MockLauncher::new();
    launcher
        .expect_launch()
        .returning(|_, _| Ok(CapturedOutput::new(Some(2), "", "Traceback: boom")));
    let client = InvocationClient::with_launcher(command, launcher);
    let error = client
        .invoke("correct", Params::new(), DEADLINE, None)
        .expect_err("transport error expected");
    let InvokeError::Transport { status, stderr, .. } = error else {
        panic!("expected Transport error, got {error:?}");
    };
    assert_eq!(status, Some(2));
    assert_eq!(stderr, "Traceback: boom");
}

#[rstest]
fn launcher_timeout_is_propagated(command: WorkerCommand) {
    let mut launcher = MockLauncher::new();
    launcher.expect_launch().returning(|_, attempt| {
        Err(InvokeError::Timeout {
            method: attempt.request().method().to_owned(),
            deadline: attempt.deadline(),
        })
    });
    let client = InvocationClient::with_launcher(command, launcher);
    let error = client
        .invoke("summarize", Params::new(), Duration::from_millis(50), None)
        .expect_err("timeout expected");
    assert_eq!(error.kind(), FailureKind::Timeout);
    assert!(error.is_retriable());
}

#[rstest]
fn garbled_output_is_protocol_error_with_raw_text(command: WorkerCommand) {
    let mut launcher = MockLauncher::new();
    launcher
        .expect_launch()
        .returning(|_, _| Ok(CapturedOutput::new(Some(0), "Segmentation fault?", "")));
    let client = InvocationClient::with_launcher(command, launcher);
    let error = client
        .invoke("polish", Params::new(), DEADLINE, None)
        .expect_err("protocol error expected");
    let InvokeError::Protocol { raw, .. } = error else {
        panic!("expected Protocol error, got {error:?}");
    };
    assert_eq!(raw, "Segmentation fault?");
}

#[rstest]
fn working_directory_is_forwarded(command: WorkerCommand) {
    let mut launcher = MockLauncher::new();
    launcher
        .expect_launch()
        .withf(|_, attempt| attempt.working_directory() == Some(Path::new("/srv/documents")))
        .times(1)
        .returning(|_, _| Err(InvokeError::transport("echo", "stub", None)));
    let client = InvocationClient::with_launcher(command, launcher);
    let result = client.invoke(
        "echo",
        Params::new(),
        DEADLINE,
        Some(Path::new("/srv/documents")),
    );
    assert!(result.is_err());
}

#[test]
fn request_ids_increase_monotonically() {
    let first = next_request_id();
    let second = next_request_id();
    let (RequestId::Number(a), RequestId::Number(b)) = (first, second) else {
        panic!("expected numeric ids");
    };
    assert!(b.as_u64() > a.as_u64());
}

#[test]
fn search_path_value_is_none_without_entries() {
    let command = WorkerCommand::new("worker");
    assert_eq!(command.search_path_value().expect("valid"), None);
}

#[cfg(unix)]
#[test]
fn search_path_value_appends_after_override() {
    let command = WorkerCommand::new("worker")
        .env("TOOL_PATH", "/a:/b")
        .search_path_var("TOOL_PATH")
        .search_path_entry("/c");
    let value = command.search_path_value().expect("valid");
    assert_eq!(
        value,
        Some((String::from("TOOL_PATH"), OsString::from("/a:/b:/c")))
    );
}

#[cfg(unix)]
#[test]
fn search_path_entry_with_separator_is_rejected() {
    let command = WorkerCommand::new("worker").search_path_entry("/a:/b");
    let error = command.search_path_value().expect_err("separator rejected");
    assert_eq!(error.kind(), FailureKind::InvalidArgument);
}
