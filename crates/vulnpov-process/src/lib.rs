//! Subprocess execution for the sandbox tools and the validator: every external process (a
//! `grep`/`find` shell-out, a container build, a container run) is launched in its own process
//! group so that a hard wall-clock deadline can be enforced by killing the whole group, not just
//! the immediate child.

pub mod error;
pub mod truncate;

pub use error::ProcessError;
pub use truncate::{truncate_head, truncate_tail};

use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::warn;

const READ_BUF_SIZE: usize = 8192;

/// Captured output and outcome of one external process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// The process's own exit code, or 137 (the conventional SIGKILL exit code) if this
    /// invocation hit its deadline and was killed.
    pub exit_code: i32,
    pub timed_out: bool,
}

impl ExecutionResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Spawns `cmd` in its own process group (so the whole group can be killed as a unit) and runs
/// it to completion or until `timeout` elapses, whichever comes first.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
) -> Result<ExecutionResult, ProcessError> {
    let command_repr = format!("{:?}", cmd.as_std());

    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    cmd.stdin(std::process::Stdio::null());
    cmd.kill_on_drop(true);

    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        command: command_repr.clone(),
        source,
    })?;

    wait_and_capture_with_timeout(child, timeout, command_repr).await
}

async fn wait_and_capture_with_timeout(
    mut child: Child,
    timeout: Duration,
    command_repr: String,
) -> Result<ExecutionResult, ProcessError> {
    let stdout = child.stdout.take().ok_or_else(|| ProcessError::Capture {
        command: command_repr.clone(),
        source: std::io::Error::other("child stdout was not piped"),
    })?;
    let stderr = child.stderr.take().ok_or_else(|| ProcessError::Capture {
        command: command_repr.clone(),
        source: std::io::Error::other("child stderr was not piped"),
    })?;

    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut stdout_buf = [0u8; READ_BUF_SIZE];
    let mut stderr_buf = [0u8; READ_BUF_SIZE];
    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut timed_out = false;

    let sleep = tokio::time::sleep(timeout);
    tokio::pin!(sleep);

    let start = Instant::now();
    while !stdout_done || !stderr_done {
        tokio::select! {
            result = stdout_reader.read(&mut stdout_buf), if !stdout_done => {
                match result {
                    Ok(0) => stdout_done = true,
                    Ok(n) => stdout.push_str(&String::from_utf8_lossy(&stdout_buf[..n])),
                    Err(_) => stdout_done = true,
                }
            }
            result = stderr_reader.read(&mut stderr_buf), if !stderr_done => {
                match result {
                    Ok(0) => stderr_done = true,
                    Ok(n) => stderr.push_str(&String::from_utf8_lossy(&stderr_buf[..n])),
                    Err(_) => stderr_done = true,
                }
            }
            () = &mut sleep, if !timed_out => {
                timed_out = true;
                warn!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    timeout_s = timeout.as_secs(),
                    command = %command_repr,
                    "killing process group after deadline",
                );
                kill_process_group(&mut child);
                break;
            }
        }
    }

    let exit_code = if timed_out {
        137
    } else {
        let status = child
            .wait()
            .await
            .map_err(|source| ProcessError::Capture {
                command: command_repr.clone(),
                source,
            })?;
        status.code().unwrap_or(1)
    };

    Ok(ExecutionResult {
        stdout,
        stderr,
        exit_code,
        timed_out,
    })
}

fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: kill() is async-signal-safe; a negative pid targets the whole group.
            unsafe {
                libc::kill(-(pid as i32), libc::SIGKILL);
            }
            return;
        }
    }
    let _ = child.start_kill();
}

/// Confirms `executable` resolves on `PATH`, used before attempting a `docker build`/`docker
/// run` so a missing toolchain surfaces as a clear infrastructure error rather than a confusing
/// spawn failure deep in the validator.
pub fn check_tool_installed(executable: &str) -> Result<(), ProcessError> {
    which::which(executable)
        .map(|_| ())
        .map_err(|_| ProcessError::ToolNotInstalled(executable.to_string()))
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
