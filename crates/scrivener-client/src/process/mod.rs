//! Process-based worker execution under a deadline.
//!
//! [`ProcessLauncher`] implements the [`WorkerLauncher`] trait by spawning the
//! worker with all three standard streams piped. The request is written on
//! its own thread and both output streams are drained on dedicated reader
//! threads while the calling thread polls for exit.
//!
//! On Unix the worker leads its own process group, so anything it spawns can
//! be signalled with it. Once the worker has exited, or when the deadline
//! elapses, the whole group is killed and the worker reaped; a [`ChildGuard`]
//! guarantees the same on every other return path.

use std::io::{Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::InvokeError;
use crate::invocation::{CapturedOutput, InvocationAttempt, WorkerCommand, WorkerLauncher};

/// Tracing target for worker process operations.
const PROCESS_TARGET: &str = "scrivener_client::process";

/// Interval between exit polls.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Time allowed for the reader threads to finish after the worker exits.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Executes workers by spawning one child process per attempt.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use scrivener_client::process::ProcessLauncher;
/// use scrivener_client::{InvocationAttempt, WorkerCommand, WorkerLauncher};
/// use scrivener_protocol::{Params, Request, RequestId};
///
/// let command = WorkerCommand::new("scrivener-tools");
/// let request = Request::new(RequestId::from(1), "echo", Params::new());
/// let attempt = InvocationAttempt::new(request, Duration::from_secs(5), None);
/// let captured = ProcessLauncher.launch(&command, &attempt);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl WorkerLauncher for ProcessLauncher {
    fn launch(
        &self,
        command: &WorkerCommand,
        attempt: &InvocationAttempt,
    ) -> Result<CapturedOutput, InvokeError> {
        run_attempt(command, attempt)
    }
}

/// Owns a spawned child and its process group.
///
/// On drop the group is killed and the child reaped unless that already
/// happened.
struct ChildGuard {
    child: Child,
    reaped: bool,
    group_killed: bool,
}

impl ChildGuard {
    const fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
            group_killed: false,
        }
    }

    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Sends `SIGKILL` to every process left in the worker's group.
    ///
    /// A group id is not reused while any member remains, so signalling it
    /// after the leader has been reaped still only reaches its descendants.
    #[cfg(unix)]
    fn kill_group(&mut self) {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if self.group_killed {
            return;
        }
        self.group_killed = true;
        let Ok(raw) = i32::try_from(self.pid()) else {
            return;
        };
        match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(error) => warn!(
                target: PROCESS_TARGET,
                pid = raw,
                %error,
                "failed to kill worker process group"
            ),
        }
    }

    #[cfg(not(unix))]
    fn kill_group(&mut self) {
        if !self.group_killed && !self.reaped {
            self.group_killed = true;
            drop(self.child.kill());
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill_group();
        if !self.reaped {
            drop(self.child.kill());
            drop(self.child.wait());
        }
    }
}

fn run_attempt(
    command: &WorkerCommand,
    attempt: &InvocationAttempt,
) -> Result<CapturedOutput, InvokeError> {
    let method = attempt.request().method();
    let payload =
        serde_json::to_string(attempt.request()).map_err(|error| InvokeError::InvalidArgument {
            message: format!("request could not be serialised: {error}"),
        })?;

    let mut process = build_command(command, attempt)?;
    debug!(
        target: PROCESS_TARGET,
        method,
        program = %command.program().display(),
        "spawning worker process"
    );

    let started = Instant::now();
    let deadline_at =
        started
            .checked_add(attempt.deadline())
            .ok_or_else(|| InvokeError::InvalidArgument {
                message: String::from("deadline is too large"),
            })?;
    let child = process.spawn().map_err(|error| {
        InvokeError::transport(
            method,
            format!(
                "failed to spawn worker '{}': {error}",
                command.program().display()
            ),
            Some(error),
        )
    })?;
    let mut guard = ChildGuard::new(child);

    let stdin = guard
        .child
        .stdin
        .take()
        .ok_or_else(|| InvokeError::transport(method, "failed to capture stdin", None))?;
    let stdout = guard
        .child
        .stdout
        .take()
        .ok_or_else(|| InvokeError::transport(method, "failed to capture stdout", None))?;
    let stderr = guard
        .child
        .stderr
        .take()
        .ok_or_else(|| InvokeError::transport(method, "failed to capture stderr", None))?;

    spawn_writer(guard.pid(), stdin, payload);
    let stdout_rx = spawn_reader(stdout);
    let stderr_rx = spawn_reader(stderr);

    let status = wait_for_exit(&mut guard, method, attempt.deadline(), deadline_at)?;
    // Descendants may still hold the output pipes open.
    guard.kill_group();
    debug!(
        target: PROCESS_TARGET,
        method,
        ?status,
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "worker process exited"
    );

    let stdout_bytes = collect(&stdout_rx, method, attempt.deadline(), deadline_at)?;
    let stderr_bytes = collect(&stderr_rx, method, attempt.deadline(), deadline_at)?;
    let stderr_text = String::from_utf8_lossy(&stderr_bytes);
    if !stderr_text.trim().is_empty() {
        debug!(
            target: PROCESS_TARGET,
            method,
            stderr = %stderr_text.trim(),
            "worker stderr output"
        );
    }

    Ok(CapturedOutput::new(
        status.code(),
        String::from_utf8_lossy(&stdout_bytes),
        stderr_text,
    ))
}

fn build_command(
    command: &WorkerCommand,
    attempt: &InvocationAttempt,
) -> Result<Command, InvokeError> {
    let mut process = Command::new(command.program());
    process.args(command.arguments());
    process.envs(command.env_overrides());
    if let Some((name, value)) = command.search_path_value()? {
        process.env(name, value);
    }
    if let Some(directory) = attempt
        .working_directory()
        .or_else(|| command.default_working_directory())
    {
        process.current_dir(directory);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        process.process_group(0);
    }
    process.stdin(Stdio::piped());
    process.stdout(Stdio::piped());
    process.stderr(Stdio::piped());
    Ok(process)
}

/// Writes the request line and closes stdin.
///
/// A worker that exits without reading its input closes the pipe early; the
/// resulting write error is logged and otherwise ignored because the exit
/// status and output decide the outcome.
fn spawn_writer(pid: u32, mut stdin: ChildStdin, payload: String) {
    thread::spawn(move || {
        let written = stdin
            .write_all(payload.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"))
            .and_then(|()| stdin.flush());
        if let Err(error) = written {
            debug!(
                target: PROCESS_TARGET,
                pid,
                %error,
                "worker closed stdin before the request was written"
            );
        }
    });
}

fn spawn_reader(mut stream: impl Read + Send + 'static) -> Receiver<std::io::Result<Vec<u8>>> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let result = stream.read_to_end(&mut buffer).map(|_| buffer);
        drop(sender.send(result));
    });
    receiver
}

fn wait_for_exit(
    guard: &mut ChildGuard,
    method: &str,
    deadline: Duration,
    deadline_at: Instant,
) -> Result<ExitStatus, InvokeError> {
    loop {
        match guard.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                let now = Instant::now();
                if now >= deadline_at {
                    warn!(
                        target: PROCESS_TARGET,
                        method,
                        pid = guard.pid(),
                        deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                        "worker timed out, killing process group"
                    );
                    return Err(InvokeError::Timeout {
                        method: method.to_owned(),
                        deadline,
                    });
                }
                thread::sleep(POLL_INTERVAL.min(deadline_at - now));
            }
            Err(error) => {
                return Err(InvokeError::transport(
                    method,
                    format!("failed to poll worker process: {error}"),
                    Some(error),
                ));
            }
        }
    }
}

/// Receives a reader thread's output, bounded by the remaining deadline.
///
/// A grandchild that inherited the pipe can hold it open after the worker
/// exits; the bound keeps such a process from stalling the call.
fn collect(
    receiver: &Receiver<std::io::Result<Vec<u8>>>,
    method: &str,
    deadline: Duration,
    deadline_at: Instant,
) -> Result<Vec<u8>, InvokeError> {
    let remaining = deadline_at
        .saturating_duration_since(Instant::now())
        .max(DRAIN_GRACE);
    match receiver.recv_timeout(remaining) {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(error)) => Err(InvokeError::transport(
            method,
            format!("failed to read worker output: {error}"),
            Some(error),
        )),
        Err(RecvTimeoutError::Timeout) => Err(InvokeError::Timeout {
            method: method.to_owned(),
            deadline,
        }),
        Err(RecvTimeoutError::Disconnected) => Err(InvokeError::transport(
            method,
            "worker output reader stopped unexpectedly",
            None,
        )),
    }
}
