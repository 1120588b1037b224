//! Unit tests for worker error types.

use rstest::rstest;
use serde_json::json;

use super::*;

#[rstest]
#[case::invalid_params(HandlerError::invalid_params("missing field `text`"), ErrorCode::InvalidParams)]
#[case::failed(HandlerError::failed("backend unavailable"), ErrorCode::InternalError)]
fn handler_errors_map_to_wire_codes(#[case] error: HandlerError, #[case] expected: ErrorCode) {
    let info = error.into_error_info();
    assert_eq!(info.kind(), Some(expected));
}

#[test]
fn failed_error_forwards_data() {
    let error = HandlerError::Failed {
        message: String::from("backend exited with status 2"),
        data: Some(json!({"status": 2})),
    };
    let info = error.into_error_info();
    assert_eq!(info.message(), "backend exited with status 2");
    assert_eq!(info.data(), Some(&json!({"status": 2})));
}

#[test]
fn invalid_params_message_names_the_problem() {
    let info = HandlerError::invalid_params("missing field `a`").into_error_info();
    assert!(
        info.message().contains("missing field `a`"),
        "unexpected message: {}",
        info.message()
    );
}

#[test]
fn run_loop_error_message_includes_source() {
    let error = RunLoopError::Write {
        source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"),
    };
    let message = error.to_string();
    assert!(message.contains("pipe closed"), "unexpected message: {message}");
}
