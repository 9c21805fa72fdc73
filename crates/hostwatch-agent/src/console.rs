use crate::usage_log::UsageLog;
use hostwatch_common::types::Recipient;
use hostwatch_sandbox::{CommandResult, Sandbox};
use std::collections::HashSet;

/// One console command from an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub user: Recipient,
    pub command: String,
}

impl CommandRequest {
    pub fn new(user: Recipient, command: impl Into<String>) -> Self {
        Self {
            user,
            command: command.into(),
        }
    }
}

/// Gate in front of the sandbox: authorize, record, execute.
pub struct Console {
    allowed: HashSet<Recipient>,
    usage_log: UsageLog,
    sandbox: Sandbox,
}

impl Console {
    pub fn new(
        allowed: impl IntoIterator<Item = Recipient>,
        usage_log: UsageLog,
        sandbox: Sandbox,
    ) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            usage_log,
            sandbox,
        }
    }

    pub fn is_allowed(&self, user: &Recipient) -> bool {
        self.allowed.contains(user)
    }

    /// Runs `request` if its user may use the console.
    ///
    /// Unknown users get [`CommandResult::unauthorized`] and leave no trace
    /// in the usage log; nothing is spawned for them.
    pub async fn handle(&self, request: &CommandRequest) -> CommandResult {
        if !self.is_allowed(&request.user) {
            tracing::warn!(user = %request.user, "Console command from unauthorized user");
            return CommandResult::unauthorized();
        }

        self.usage_log.record(&request.user, &request.command).await;
        let result = self.sandbox.execute(&request.command).await;
        tracing::info!(
            user = %request.user,
            outcome = ?result.outcome,
            duration_ms = result.duration_ms,
            "Console command handled"
        );
        result
    }
}
