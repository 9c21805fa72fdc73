use serde::Serialize;

/// Appended when rendered output is cut to the transport cap.
pub const TRUNCATION_MARKER: &str = "\n... (output truncated)";

/// How a command request ended. Every variant is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The process exited on its own. `exit_code` is `None` when it was
    /// ended by a signal.
    Completed { exit_code: Option<i32> },
    /// Rejected by the denylist; nothing was spawned.
    Forbidden { command: String },
    /// Killed after running past the wall-clock limit.
    TimedOut { after_secs: u64 },
    /// Killed after its combined output passed the byte budget.
    OutputOverflow { limit_bytes: usize },
    /// Could not be started (empty or malformed line, unknown program,
    /// permission denied, I/O failure while running).
    LaunchFailed { reason: String },
    /// The requesting identity may not use the console; nothing was spawned.
    Unauthorized,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Completed { exit_code: Some(0) })
    }
}

/// What the console hands back to the transport.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub outcome: CommandOutcome,
    /// Text for the operator, at most `max_rendered_chars` characters plus
    /// [`TRUNCATION_MARKER`].
    pub rendered: String,
    pub duration_ms: u64,
}

/// Captured streams of a completed process.
#[derive(Debug, Default)]
pub(crate) struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandResult {
    pub(crate) fn new(
        outcome: CommandOutcome,
        output: Option<&CapturedOutput>,
        duration_ms: u64,
        max_rendered_chars: usize,
    ) -> Self {
        let text = render(&outcome, output);
        Self {
            rendered: cap(&text, max_rendered_chars),
            outcome,
            duration_ms,
        }
    }

    /// Result for a request refused by the console gate.
    pub fn unauthorized() -> Self {
        let outcome = CommandOutcome::Unauthorized;
        Self {
            rendered: render(&outcome, None),
            outcome,
            duration_ms: 0,
        }
    }
}

fn render(outcome: &CommandOutcome, output: Option<&CapturedOutput>) -> String {
    match outcome {
        CommandOutcome::Completed { exit_code } => {
            let (stdout, stderr) = match output {
                Some(o) => (
                    String::from_utf8_lossy(&o.stdout),
                    String::from_utf8_lossy(&o.stderr),
                ),
                None => (Default::default(), Default::default()),
            };

            if outcome.is_success() {
                let combined = format!("{stdout}{stderr}");
                if combined.trim().is_empty() {
                    "Command completed successfully (no output)".to_string()
                } else {
                    combined
                }
            } else {
                let header = match exit_code {
                    Some(code) => format!("Error (exit code {code}):"),
                    None => "Error (terminated by signal):".to_string(),
                };
                format!("{header}\n{stderr}{stdout}")
            }
        }
        CommandOutcome::Forbidden { command } => {
            format!("Command '{command}' is forbidden")
        }
        CommandOutcome::TimedOut { after_secs } => {
            format!("Error: command timed out after {after_secs} seconds and was terminated")
        }
        CommandOutcome::OutputOverflow { limit_bytes } => {
            format!("Error: command output exceeded {limit_bytes} bytes and the command was terminated")
        }
        CommandOutcome::LaunchFailed { reason } => {
            format!("Error: failed to run command: {reason}")
        }
        CommandOutcome::Unauthorized => "Access denied: console commands are not allowed for this user".to_string(),
    }
}

/// Cuts `text` to `max_chars` characters on a char boundary.
fn cap(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
    }
}
