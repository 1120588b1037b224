//! Text backend that runs an external command per call.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;

use tracing::debug;

use super::{BACKEND_TARGET, BackendError, TextBackend};

/// Backend that runs an external command per call.
///
/// The instructions are passed as the final argument, the text is written to
/// standard input and the reply is read from standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBackend {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandBackend {
    /// Creates a backend running `program` with `args` before the
    /// instructions.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Returns the backend program.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl TextBackend for CommandBackend {
    fn complete(&self, instructions: &str, text: &str) -> Result<String, BackendError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(instructions)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BackendError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let (written, finished) = thread::scope(|scope| {
            let writer = scope.spawn(move || feed(stdin, text));
            let finished = child.wait_with_output();
            (writer.join(), finished)
        });
        let output = finished.map_err(|source| BackendError::Io { source })?;
        if let Ok(Err(source)) = written {
            if source.kind() != io::ErrorKind::BrokenPipe {
                return Err(BackendError::Io { source });
            }
            debug!(
                target: BACKEND_TARGET,
                program = %self.program.display(),
                "backend closed stdin before reading all input"
            );
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(BackendError::Failed {
                status: output.status.code(),
                message: if stderr.is_empty() {
                    String::from("backend exited without stderr output")
                } else {
                    stderr
                },
            });
        }

        String::from_utf8(output.stdout).map_err(|error| BackendError::InvalidOutput {
            message: error.to_string(),
        })
    }
}

fn feed(stdin: Option<ChildStdin>, text: &str) -> io::Result<()> {
    let Some(mut pipe) = stdin else {
        return Ok(());
    };
    pipe.write_all(text.as_bytes())?;
    pipe.flush()
}
