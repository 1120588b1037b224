//! Unit tests for the CLI runtime.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use rstest::rstest;
use scrivener_protocol::{ErrorCode, ErrorInfo};
use serde_json::{Value, json};

use super::*;

struct StaticLoader(Config);

impl ConfigLoader for StaticLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.0.clone())
    }
}

fn os(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

fn quiet_config() -> Config {
    Config {
        log_filter: String::from("off"),
        ..Config::default()
    }
}

fn run_captured(args: &[&str]) -> (ExitCode, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run_with_loader(
        os(args),
        &mut stdout,
        &mut stderr,
        &StaticLoader(quiet_config()),
    );
    (
        exit,
        String::from_utf8(stdout).expect("stdout utf8"),
        String::from_utf8(stderr).expect("stderr utf8"),
    )
}

fn parse_line(stdout: &str) -> Value {
    serde_json::from_str(stdout.trim()).expect("stdout is one JSON line")
}

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(os(args)).expect("valid arguments")
}

#[test]
fn success_is_rendered_with_result() {
    let line = render_outcome(&Ok(json!({"summary": "ok"})));
    assert_eq!(line, json!({"status": "success", "result": {"summary": "ok"}}));
}

#[test]
fn timeout_is_rendered_as_retriable() {
    let error = InvokeError::Timeout {
        method: String::from("summarize"),
        deadline: Duration::from_millis(50),
    };
    let line = render_outcome(&Err(error));
    assert_eq!(line["status"], json!("error"));
    assert_eq!(line["kind"], json!("timeout"));
    assert_eq!(line["retriable"], json!(true));
}

#[test]
fn tool_error_carries_code_and_data() {
    let error = InvokeError::Tool {
        method: String::from("correct"),
        error: ErrorInfo::new(ErrorCode::InternalError, "backend down")
            .with_data(json!({"reply": ""})),
    };
    let line = render_outcome(&Err(error));
    assert_eq!(line["kind"], json!("tool_error"));
    assert_eq!(line["code"], json!(-32603));
    assert_eq!(line["data"], json!({"reply": ""}));
    assert_eq!(line["retriable"], json!(false));
}

#[test]
fn worker_command_uses_configuration() {
    let config = Config {
        worker_program: PathBuf::from("/opt/scrivener/tools"),
        worker_args: vec![String::from("--log-format"), String::from("compact")],
        working_directory: Some(PathBuf::from("/srv/documents")),
        ..Config::default()
    };
    let command = worker_command(&cli(&["scrivener", "echo"]), &config);
    assert_eq!(command.program(), Path::new("/opt/scrivener/tools"));
    assert_eq!(command.arguments(), ["--log-format", "compact"]);
    assert_eq!(
        command.default_working_directory(),
        Some(Path::new("/srv/documents"))
    );
}

#[test]
fn worker_flags_override_configuration() {
    let config = Config {
        worker_args: vec![String::from("--from-config")],
        ..Config::default()
    };
    let parsed = cli(&[
        "scrivener",
        "echo",
        "--worker",
        "sh",
        "--worker-arg",
        "-c",
        "--worker-arg",
        "cat",
    ]);
    let command = worker_command(&parsed, &config);
    assert_eq!(command.program(), Path::new("sh"));
    assert_eq!(command.arguments(), ["-c", "cat"]);
}

#[test]
fn help_is_written_to_stdout() {
    let (exit, stdout, _) = run_captured(&["scrivener", "--help"]);
    assert_eq!(exit, ExitCode::SUCCESS);
    assert!(stdout.contains("METHOD"), "help output: {stdout}");
}

#[test]
fn missing_method_is_a_usage_error() {
    let (exit, stdout, stderr) = run_captured(&["scrivener"]);
    assert_eq!(exit, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    assert!(stderr.contains("failed to parse command-line arguments"));
}

#[rstest]
#[case::bad_pair(&["scrivener", "echo", "--param", "oops"])]
#[case::blank_method(&["scrivener", "  "])]
fn invalid_input_is_reported_without_spawning(#[case] args: &[&str]) {
    let (exit, stdout, _) = run_captured(args);
    assert_eq!(exit, ExitCode::FAILURE);
    let line = parse_line(&stdout);
    assert_eq!(line["kind"], json!("invalid_argument"));
}

#[cfg(unix)]
#[test]
fn successful_call_prints_result_line() {
    let script = concat!(
        "read line; ",
        "id=$(printf '%s' \"$line\" | sed 's/.*\"id\":\\([0-9]*\\).*/\\1/'); ",
        "printf '{\"protocol_version\":\"2.0\",\"id\":%s,\"result\":\"hi\"}\\n' \"$id\""
    );
    let (exit, stdout, _) = run_captured(&[
        "scrivener",
        "echo",
        "--param",
        "text=hi",
        "--worker",
        "sh",
        "--worker-arg",
        "-c",
        "--worker-arg",
        script,
    ]);
    assert_eq!(exit, ExitCode::SUCCESS);
    assert_eq!(parse_line(&stdout), json!({"status": "success", "result": "hi"}));
}

#[cfg(unix)]
#[test]
fn crashing_worker_prints_transport_error() {
    let (exit, stdout, _) = run_captured(&[
        "scrivener",
        "echo",
        "--worker",
        "sh",
        "--worker-arg",
        "-c",
        "--worker-arg",
        "exit 9",
    ]);
    assert_eq!(exit, ExitCode::FAILURE);
    let line = parse_line(&stdout);
    assert_eq!(line["kind"], json!("transport_error"));
    assert_eq!(line["retriable"], json!(true));
}
