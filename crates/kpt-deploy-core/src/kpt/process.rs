//! Blocking child-process execution with output streaming and cancellation.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::cancel::CancelToken;
use crate::error::ToolError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Run a command, forwarding stdout and stderr to `out`.
pub(crate) fn run_streaming(
    command: Command,
    out: &mut dyn Write,
    cancel: &CancelToken,
) -> Result<(), ToolError> {
    run(command, cancel, |_, bytes| out.write_all(bytes))
}

/// Run a command and return its stdout. Stderr is logged at debug level.
pub(crate) fn run_capture(command: Command, cancel: &CancelToken) -> Result<Vec<u8>, ToolError> {
    let mut stdout = Vec::new();
    run(command, cancel, |stream, bytes| {
        match stream {
            Stream::Stdout => stdout.extend_from_slice(bytes),
            Stream::Stderr => tracing::debug!("{}", String::from_utf8_lossy(bytes).trim_end()),
        }
        Ok(())
    })?;
    Ok(stdout)
}

pub(crate) fn describe(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().to_string()];
    parts.extend(
        command
            .get_args()
            .map(|arg| arg.to_string_lossy().to_string()),
    );
    parts.join(" ")
}

fn run(
    mut command: Command,
    cancel: &CancelToken,
    mut on_chunk: impl FnMut(Stream, &[u8]) -> std::io::Result<()>,
) -> Result<(), ToolError> {
    let description = describe(&command);
    if cancel.is_cancelled() {
        return Err(ToolError::Cancelled {
            command: description,
        });
    }

    tracing::debug!(command = %description, "Running external command");
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ToolError::Spawn {
            command: description.clone(),
            source,
        })?;

    let (tx, rx) = mpsc::channel();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(forward(stdout, Stream::Stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(forward(stderr, Stream::Stderr, tx.clone()));
    }
    drop(tx);

    loop {
        if cancel.is_cancelled() {
            return Err(kill(&mut child, description));
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok((stream, bytes)) => {
                if let Err(source) = on_chunk(stream, &bytes) {
                    terminate(&mut child, &description);
                    return Err(ToolError::Io {
                        command: description,
                        source,
                    });
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for reader in readers {
        let _ = reader.join();
    }

    loop {
        if cancel.is_cancelled() {
            return Err(kill(&mut child, description));
        }
        match child.wait_timeout(POLL_INTERVAL) {
            Ok(Some(status)) if status.success() => return Ok(()),
            Ok(Some(status)) => {
                return Err(ToolError::Exit {
                    command: description,
                    code: status.code(),
                });
            }
            Ok(None) => {}
            Err(source) => {
                return Err(ToolError::Io {
                    command: description,
                    source,
                });
            }
        }
    }
}

fn forward<R: Read + Send + 'static>(
    mut reader: R,
    stream: Stream,
    tx: Sender<(Stream, Vec<u8>)>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send((stream, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

fn kill(child: &mut Child, command: String) -> ToolError {
    tracing::warn!(command = %command, "Cancelling external command");
    terminate(child, &command);
    ToolError::Cancelled { command }
}

/// Kill and reap `child`. Failures are logged; the caller already has an error to report.
fn terminate(child: &mut Child, command: &str) {
    if let Err(e) = child.kill() {
        tracing::debug!(command = %command, error = %e, "Failed to kill external command");
    }
    if let Err(e) = child.wait() {
        tracing::debug!(command = %command, error = %e, "Failed to reap external command");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.args(["-c", script]);
        command
    }

    #[test]
    fn test_streams_stdout_and_stderr() {
        let mut out = Vec::new();
        run_streaming(sh("echo out; echo err 1>&2"), &mut out, &CancelToken::new()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("out"));
        assert!(text.contains("err"));
    }

    #[test]
    fn test_capture_returns_only_stdout() {
        let bytes = run_capture(sh("echo data; echo noise 1>&2"), &CancelToken::new()).unwrap();
        assert_eq!(bytes, b"data\n");
    }

    #[test]
    fn test_non_zero_exit_is_reported() {
        let err = run_capture(sh("exit 3"), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, ToolError::Exit { code: Some(3), .. }));
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let command = Command::new("kpt-deploy-definitely-missing-binary");
        let err = run_capture(command, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[test]
    fn test_cancelled_before_start_never_spawns() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = run_capture(sh("exit 0"), &cancel).unwrap_err();
        assert!(matches!(err, ToolError::Cancelled { .. }));
    }

    #[test]
    fn test_exit_status_read_after_pipes_close() {
        let err = run_capture(sh("exec >&- 2>&-; sleep 0.2; exit 4"), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, ToolError::Exit { code: Some(4), .. }));
    }

    #[test]
    fn test_cancel_while_waiting_on_exit() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            trigger.cancel();
        });

        let started = Instant::now();
        let err = run_capture(sh("exec >&- 2>&-; exec sleep 30"), &cancel).unwrap_err();
        handle.join().unwrap();

        assert!(matches!(err, ToolError::Cancelled { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_terminate_tolerates_exited_child() {
        let mut child = sh("exit 0").spawn().unwrap();
        child.wait().unwrap();

        terminate(&mut child, "sh -c exit 0");

        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn test_cancel_kills_running_process() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let started = Instant::now();
        let err = run_capture(sh("exec sleep 30"), &cancel).unwrap_err();
        handle.join().unwrap();

        assert!(matches!(err, ToolError::Cancelled { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
