//! Invocation client orchestrating one worker process per call.
//!
//! The [`InvocationClient`] validates the call, builds a [`Request`] with a
//! fresh correlation id, delegates process execution to a [`WorkerLauncher`]
//! and classifies the captured output into a result or an [`InvokeError`].
//!
//! The launcher abstraction enables test doubles that return canned output
//! without spawning real processes.

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use scrivener_protocol::{Params, Request, RequestId};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::InvokeError;
use crate::extract::{Extracted, extract};
use crate::process::ProcessLauncher;

/// Tracing target for invocation operations.
const INVOCATION_TARGET: &str = "scrivener_client::invocation";

/// Default variable extended with search-path entries.
pub const DEFAULT_SEARCH_PATH_VAR: &str = "PATH";

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a process-wide, monotonically increasing correlation id.
fn next_request_id() -> RequestId {
    RequestId::from(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
}

/// Description of the worker executable and its environment.
///
/// # Example
///
/// ```
/// use scrivener_client::WorkerCommand;
///
/// let command = WorkerCommand::new("scrivener-tools")
///     .arg("--log-format")
///     .arg("compact")
///     .env("PYTHONUNBUFFERED", "1")
///     .search_path_entry("/opt/scrivener/bin");
/// assert_eq!(command.arguments(), ["--log-format", "compact"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<String>,
    working_directory: Option<PathBuf>,
    env: BTreeMap<String, String>,
    search_path: Vec<PathBuf>,
    search_path_var: String,
}

impl WorkerCommand {
    /// Creates a command for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_directory: None,
            env: BTreeMap::new(),
            search_path: Vec::new(),
            search_path_var: String::from(DEFAULT_SEARCH_PATH_VAR),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the default working directory for the worker.
    #[must_use]
    pub fn working_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(directory.into());
        self
    }

    /// Overrides one environment variable for the worker.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Appends a directory to the worker's search path.
    #[must_use]
    pub fn search_path_entry(mut self, directory: impl Into<PathBuf>) -> Self {
        self.search_path.push(directory.into());
        self
    }

    /// Names the variable that search-path entries are appended to.
    #[must_use]
    pub fn search_path_var(mut self, name: impl Into<String>) -> Self {
        self.search_path_var = name.into();
        self
    }

    /// Returns the program path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Returns the arguments.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Returns the default working directory, if any.
    #[must_use]
    pub fn default_working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    /// Returns the environment overrides.
    #[must_use]
    pub const fn env_overrides(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Computes the value of the search-path variable for the worker.
    ///
    /// Returns `None` when no entries were added. Existing entries, taken from
    /// an explicit override or the inherited environment, come first.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::InvalidArgument`] if an entry contains the
    /// platform's path separator.
    pub fn search_path_value(&self) -> Result<Option<(String, OsString)>, InvokeError> {
        if self.search_path.is_empty() {
            return Ok(None);
        }
        let inherited = self
            .env
            .get(&self.search_path_var)
            .map(OsString::from)
            .or_else(|| env::var_os(&self.search_path_var))
            .unwrap_or_default();
        let entries = env::split_paths(&inherited).chain(self.search_path.iter().cloned());
        let joined = env::join_paths(entries).map_err(|error| InvokeError::InvalidArgument {
            message: format!("invalid search path entry: {error}"),
        })?;
        Ok(Some((self.search_path_var.clone(), joined)))
    }
}

/// One call's worth of state handed to a [`WorkerLauncher`].
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationAttempt {
    request: Request,
    deadline: Duration,
    working_directory: Option<PathBuf>,
}

impl InvocationAttempt {
    /// Creates an attempt.
    #[must_use]
    pub const fn new(request: Request, deadline: Duration, working_directory: Option<PathBuf>) -> Self {
        Self {
            request,
            deadline,
            working_directory,
        }
    }

    /// Returns the request to send.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the deadline for the whole attempt.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Returns the per-call working directory, if any.
    #[must_use]
    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }
}

/// Output captured from a worker that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl CapturedOutput {
    /// Creates captured output. `exit_code` is `None` when the worker was
    /// terminated by a signal.
    #[must_use]
    pub fn new(exit_code: Option<i32>, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Returns the exit code.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Returns whether the worker exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    /// Returns the captured standard output.
    #[must_use]
    pub const fn stdout(&self) -> &str {
        self.stdout.as_str()
    }

    /// Returns the captured standard error.
    #[must_use]
    pub const fn stderr(&self) -> &str {
        self.stderr.as_str()
    }
}

/// Trait abstracting worker process execution for testability.
///
/// The production implementation is [`ProcessLauncher`], which spawns a real
/// child process. Implementations must enforce the attempt's deadline and
/// leave no process running when they return.
pub trait WorkerLauncher {
    /// Runs the worker for one attempt and captures its output.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Timeout`] when the deadline elapses and
    /// [`InvokeError::Transport`] when the worker cannot be spawned or its
    /// pipes fail.
    fn launch(
        &self,
        command: &WorkerCommand,
        attempt: &InvocationAttempt,
    ) -> Result<CapturedOutput, InvokeError>;
}

/// Invokes worker methods, one process per call.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use scrivener_client::{InvocationClient, WorkerCommand};
/// use scrivener_protocol::Params;
///
/// let client = InvocationClient::new(WorkerCommand::new("scrivener-tools"));
/// let mut params = Params::new();
/// params.insert("text".into(), "hello".into());
/// let result = client.invoke("echo", params, Duration::from_secs(5), None);
/// ```
#[derive(Debug, Clone)]
pub struct InvocationClient<L = ProcessLauncher> {
    command: WorkerCommand,
    launcher: L,
}

impl InvocationClient {
    /// Creates a client that spawns real worker processes.
    #[must_use]
    pub const fn new(command: WorkerCommand) -> Self {
        Self::with_launcher(command, ProcessLauncher)
    }
}

impl<L> InvocationClient<L> {
    /// Creates a client with a custom launcher.
    #[must_use]
    pub const fn with_launcher(command: WorkerCommand, launcher: L) -> Self {
        Self { command, launcher }
    }

    /// Returns the worker command.
    #[must_use]
    pub const fn command(&self) -> &WorkerCommand {
        &self.command
    }

    /// Returns the launcher.
    #[must_use]
    pub const fn launcher(&self) -> &L {
        &self.launcher
    }
}

impl<L: WorkerLauncher> InvocationClient<L> {
    /// Invokes `method` with `params`, waiting at most `deadline`.
    ///
    /// `working_directory` overrides the command's default for this call.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::InvalidArgument`] without spawning when the
    /// method is blank or the deadline is zero; otherwise any error reported
    /// by the launcher or by response classification.
    pub fn invoke(
        &self,
        method: &str,
        params: Params,
        deadline: Duration,
        working_directory: Option<&Path>,
    ) -> Result<Value, InvokeError> {
        let method_name = method.trim();
        if method_name.is_empty() {
            return Err(InvokeError::InvalidArgument {
                message: String::from("method name must not be empty"),
            });
        }
        if deadline.is_zero() {
            return Err(InvokeError::InvalidArgument {
                message: String::from("deadline must be positive"),
            });
        }

        let request = Request::new(next_request_id(), method_name, params);
        let attempt = InvocationAttempt::new(
            request,
            deadline,
            working_directory.map(Path::to_path_buf),
        );

        debug!(
            target: INVOCATION_TARGET,
            method = method_name,
            id = %attempt.request().id(),
            deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            "invoking worker method"
        );

        let started = Instant::now();
        let captured = self.launcher.launch(&self.command, &attempt)?;
        let outcome = classify(method_name, attempt.request().id(), &captured);

        info!(
            target: INVOCATION_TARGET,
            method = method_name,
            id = %attempt.request().id(),
            status = ?captured.exit_code(),
            success = outcome.is_ok(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "worker invocation finished"
        );
        outcome
    }
}

/// Maps a completed worker run onto the caller-visible result.
fn classify(
    method: &str,
    id: &RequestId,
    captured: &CapturedOutput,
) -> Result<Value, InvokeError> {
    if !captured.success() {
        let message = captured.exit_code().map_or_else(
            || String::from("worker was terminated by a signal"),
            |code| format!("worker exited with status {code}"),
        );
        return Err(InvokeError::Transport {
            method: method.to_owned(),
            message,
            status: captured.exit_code(),
            stderr: captured.stderr().to_owned(),
            source: None,
        });
    }

    match extract(captured.stdout(), id) {
        Ok(Extracted::Success(value)) => Ok(value),
        Ok(Extracted::ToolError(error)) => Err(InvokeError::Tool {
            method: method.to_owned(),
            error,
        }),
        Err(violation) => {
            let (message, raw) = violation.into_parts();
            Err(InvokeError::Protocol {
                method: method.to_owned(),
                message,
                raw,
            })
        }
    }
}

#[cfg(test)]
mod tests;
