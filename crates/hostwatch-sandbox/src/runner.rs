//! Spawning, draining and tearing down console commands.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::policy::CommandPolicy;
use crate::result::{CapturedOutput, CommandOutcome, CommandResult};

const READ_CHUNK: usize = 8 * 1024;

/// Resource limits applied to every console command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxLimits {
    pub timeout: Duration,
    /// Combined stdout + stderr budget while running.
    pub max_output_bytes: usize,
    /// Characters kept in [`CommandResult::rendered`].
    pub max_rendered_chars: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_output_bytes: 1024 * 1024,
            max_rendered_chars: 4000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("failed to start process: {0}")]
    Spawn(std::io::Error),
    #[error("i/o error while running: {0}")]
    Io(std::io::Error),
    #[error("timed out")]
    Timeout,
    #[error("output exceeded {0} bytes")]
    Overflow(usize),
}

/// Runs console commands under a [`CommandPolicy`] and [`SandboxLimits`].
#[derive(Debug, Clone)]
pub struct Sandbox {
    policy: CommandPolicy,
    limits: SandboxLimits,
}

impl Sandbox {
    pub fn new(policy: CommandPolicy, limits: SandboxLimits) -> Self {
        Self { policy, limits }
    }

    pub fn policy(&self) -> &CommandPolicy {
        &self.policy
    }

    pub fn limits(&self) -> &SandboxLimits {
        &self.limits
    }

    /// Runs `command_line` and always returns a terminal result.
    ///
    /// The line is split with POSIX shell quoting rules but no shell is
    /// involved: pipes, redirections and globs are passed through as
    /// literal arguments. Forbidden programs are rejected before spawning.
    pub async fn execute(&self, command_line: &str) -> CommandResult {
        let started = Instant::now();
        let max_chars = self.limits.max_rendered_chars;
        let finish = |outcome: CommandOutcome, output: Option<&CapturedOutput>| {
            CommandResult::new(
                outcome,
                output,
                started.elapsed().as_millis() as u64,
                max_chars,
            )
        };

        let tokens = match shell_words::split(command_line) {
            Ok(tokens) => tokens,
            Err(e) => {
                return finish(
                    CommandOutcome::LaunchFailed {
                        reason: format!("malformed command line: {e}"),
                    },
                    None,
                );
            }
        };
        let Some((program, args)) = tokens.split_first() else {
            return finish(
                CommandOutcome::LaunchFailed {
                    reason: "empty command".to_string(),
                },
                None,
            );
        };

        if let Some(command) = self.policy.forbidden_match(program) {
            tracing::warn!(program = %program, "Rejected forbidden console command");
            return finish(CommandOutcome::Forbidden { command }, None);
        }

        let timeout = self.limits.timeout;
        match run(program, args, timeout, self.limits.max_output_bytes).await {
            Ok((status, output)) => {
                tracing::info!(
                    program = %program,
                    exit_code = ?status.code(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Console command finished"
                );
                finish(
                    CommandOutcome::Completed {
                        exit_code: status.code(),
                    },
                    Some(&output),
                )
            }
            Err(RunError::Timeout) => {
                tracing::warn!(program = %program, timeout_ms = timeout.as_millis() as u64, "Console command timed out");
                finish(
                    CommandOutcome::TimedOut {
                        after_secs: secs_rounded_up(timeout),
                    },
                    None,
                )
            }
            Err(RunError::Overflow(limit_bytes)) => {
                tracing::warn!(program = %program, limit_bytes, "Console command exceeded output limit");
                finish(CommandOutcome::OutputOverflow { limit_bytes }, None)
            }
            Err(e @ (RunError::Spawn(_) | RunError::Io(_))) => {
                tracing::warn!(program = %program, error = %e, "Console command failed to run");
                finish(
                    CommandOutcome::LaunchFailed {
                        reason: e.to_string(),
                    },
                    None,
                )
            }
        }
    }
}

/// Kills a child's process group when dropped or when [`kill`](Self::kill)
/// is called, whichever comes first.
struct ProcessGroupGuard {
    pgid: Option<i32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|p| i32::try_from(p).ok()),
        }
    }

    fn kill(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        #[cfg(unix)]
        {
            // SAFETY: kill(2) has no memory-safety preconditions. A negative
            // pid addresses the process group created for this child.
            let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
            if rc != 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(libc::ESRCH) {
                    tracing::warn!(pgid, error = %err, "Failed to kill process group");
                }
            }
        }
        #[cfg(not(unix))]
        let _ = pgid;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

async fn run(
    program: &str,
    args: &[String],
    timeout: Duration,
    max_output_bytes: usize,
) -> Result<(ExitStatus, CapturedOutput), RunError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(RunError::Spawn)?;
    let mut group = ProcessGroupGuard::new(child.id());

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let result = match tokio::time::timeout(
        timeout,
        capture(&mut child, stdout, stderr, max_output_bytes),
    )
    .await
    {
        Ok(result) => result,
        Err(_elapsed) => Err(RunError::Timeout),
    };

    // Background children may outlive the leader; the group goes either way.
    // While any member is left the kernel keeps the pgid allocated; an empty
    // group makes the kill a no-op unless the pid space wrapped in between.
    group.kill();
    if result.is_err() {
        let _ = child.start_kill();
        if let Err(e) = child.wait().await {
            tracing::warn!(error = %e, "Failed to reap console command");
        }
    }
    result
}

async fn capture(
    child: &mut Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    max_output_bytes: usize,
) -> Result<(ExitStatus, CapturedOutput), RunError> {
    let output = drain(stdout, stderr, max_output_bytes).await?;
    let status = child.wait().await.map_err(RunError::Io)?;
    Ok((status, output))
}

/// Whole seconds for operator-facing text, never reporting 0 for a
/// sub-second limit.
fn secs_rounded_up(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

enum Stream {
    Stdout,
    Stderr,
}

/// Reads both pipes to EOF, failing as soon as their combined size passes
/// `limit`.
async fn drain(
    mut stdout: Option<ChildStdout>,
    mut stderr: Option<ChildStderr>,
    limit: usize,
) -> Result<CapturedOutput, RunError> {
    let mut output = CapturedOutput::default();
    let mut out_buf = [0u8; READ_CHUNK];
    let mut err_buf = [0u8; READ_CHUNK];

    while stdout.is_some() || stderr.is_some() {
        let (stream, read) = tokio::select! {
            r = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => (Stream::Stdout, r),
            r = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => (Stream::Stderr, r),
        };
        let n = read.map_err(RunError::Io)?;

        match (stream, n) {
            (Stream::Stdout, 0) => stdout = None,
            (Stream::Stderr, 0) => stderr = None,
            (Stream::Stdout, n) => output.stdout.extend_from_slice(&out_buf[..n]),
            (Stream::Stderr, n) => output.stderr.extend_from_slice(&err_buf[..n]),
        }

        if output.stdout.len() + output.stderr.len() > limit {
            return Err(RunError::Overflow(limit));
        }
    }

    Ok(output)
}

async fn read_chunk<R: AsyncRead + Unpin>(
    stream: &mut Option<R>,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    match stream {
        Some(s) => s.read(buf).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_seconds_round_up() {
        assert_eq!(secs_rounded_up(Duration::from_millis(300)), 1);
        assert_eq!(secs_rounded_up(Duration::from_secs(10)), 10);
        assert_eq!(secs_rounded_up(Duration::from_millis(10_001)), 11);
        assert_eq!(secs_rounded_up(Duration::ZERO), 0);
    }
}
