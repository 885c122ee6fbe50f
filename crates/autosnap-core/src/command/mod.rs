//! Bounded execution of external tools and blocking in-process calls.
//!
//! Every call that can hang on the display server or a platform bridge goes
//! through this module so that it fails with [`CommandError::TimedOut`]
//! instead of blocking a capture session.

pub mod errors;

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

pub use errors::CommandError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run `command` to completion, killing it if it outlives `timeout`.
///
/// A non-zero exit is returned as `Ok` with `success == false`; use
/// [`run_checked`] to turn it into an error.
pub fn run_with_timeout(
    mut command: Command,
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    let program = command.get_program().to_string_lossy().to_string();

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CommandError::NotFound {
                    program: program.clone(),
                }
            } else {
                CommandError::SpawnFailed {
                    program: program.clone(),
                    source,
                }
            }
        })?;

    // Drain pipes on threads so a chatty child cannot fill them and stall.
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if start.elapsed() >= timeout => {
                if let Err(e) = child.kill() {
                    warn!(
                        event = "core.command.kill_failed",
                        program = %program,
                        error = %e
                    );
                }
                let _ = child.wait();
                warn!(
                    event = "core.command.timed_out",
                    program = %program,
                    timeout_ms = timeout.as_millis() as u64
                );
                return Err(CommandError::TimedOut { program, timeout });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                return Err(CommandError::SpawnFailed { program, source });
            }
        }
    };

    let stdout = stdout_reader.map(join_reader).unwrap_or_default();
    let stderr = stderr_reader.map(join_reader).unwrap_or_default();

    debug!(
        event = "core.command.completed",
        program = %program,
        code = ?status.code(),
        elapsed_ms = start.elapsed().as_millis() as u64
    );

    Ok(CommandOutput {
        status_code: status.code(),
        success: status.success(),
        stdout,
        stderr,
    })
}

/// Like [`run_with_timeout`], but a non-zero exit becomes
/// [`CommandError::NonZeroExit`].
pub fn run_checked(command: Command, timeout: Duration) -> Result<CommandOutput, CommandError> {
    let program = command.get_program().to_string_lossy().to_string();
    let output = run_with_timeout(command, timeout)?;
    if output.success {
        Ok(output)
    } else {
        Err(CommandError::NonZeroExit {
            program,
            code: output.status_code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Run blocking in-process work on a helper thread and wait at most
/// `timeout` for it.
///
/// On timeout the helper thread is abandoned; its result is dropped when it
/// eventually finishes.
pub fn run_bounded<T, F>(operation: &str, timeout: Duration, work: F) -> Result<T, CommandError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(work());
    });

    match rx.recv_timeout(timeout) {
        Ok(value) => Ok(value),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(
                event = "core.command.bounded_timed_out",
                operation = operation,
                timeout_ms = timeout.as_millis() as u64
            );
            Err(CommandError::TimedOut {
                program: operation.to_string(),
                timeout,
            })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(CommandError::WorkerDisconnected {
            operation: operation.to_string(),
        }),
    }
}

/// Whether `program` resolves on PATH.
pub fn is_available(program: &str) -> bool {
    which::which(program).is_ok()
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}
