use hostwatch_common::types::{MetricKind, Recipient, Thresholds};
use hostwatch_sandbox::{CommandPolicy, SandboxLimits};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Supplies or overrides `bot_token`.
pub const BOT_TOKEN_ENV: &str = "HOSTWATCH_BOT_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Alert recipients; also the identities allowed to use the console.
    #[serde(default)]
    pub recipients: Vec<Recipient>,
    #[serde(default)]
    pub forbidden_commands: Vec<String>,
    #[serde(default = "default_usage_log_path")]
    pub usage_log_path: PathBuf,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SandboxConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    #[serde(default = "default_max_rendered_chars")]
    pub max_rendered_chars: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
            max_rendered_chars: default_max_rendered_chars(),
        }
    }
}

impl SandboxConfig {
    pub fn limits(&self) -> SandboxLimits {
        SandboxLimits {
            timeout: Duration::from_secs(self.timeout_secs),
            max_output_bytes: self.max_output_bytes,
            max_rendered_chars: self.max_rendered_chars,
        }
    }
}

fn default_telegram_api_base() -> String {
    hostwatch_notify::telegram::DEFAULT_API_BASE.to_string()
}

fn default_poll_interval() -> u64 {
    30
}

fn default_usage_log_path() -> PathBuf {
    PathBuf::from("logs/usage.log")
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_output_bytes() -> usize {
    1024 * 1024
}

fn default_max_rendered_chars() -> usize {
    4000
}

impl AgentConfig {
    /// Reads, parses and validates the file at `path`, then applies
    /// [`BOT_TOKEN_ENV`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.override_bot_token(std::env::var(BOT_TOKEN_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates without touching the environment.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the file's token with a non-blank `token`.
    pub fn override_bot_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.bot_token = Some(token);
        }
    }

    /// Checks invariants and normalises the forbidden command names.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        for kind in MetricKind::ALL {
            let value = self.thresholds.get(kind);
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "thresholds.{kind} must be a finite number, got {value}"
                )));
            }
        }
        if self.telegram_api_base.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "telegram_api_base must not be empty".to_string(),
            ));
        }
        if self.sandbox.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "sandbox.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.sandbox.max_output_bytes == 0 || self.sandbox.max_rendered_chars == 0 {
            return Err(ConfigError::Invalid(
                "sandbox output limits must be greater than 0".to_string(),
            ));
        }

        let mut forbidden: Vec<String> = self
            .forbidden_commands
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        forbidden.sort();
        forbidden.dedup();
        self.forbidden_commands = forbidden;

        Ok(())
    }

    /// The token the daemon needs to deliver alerts.
    pub fn require_bot_token(&self) -> Result<&str, ConfigError> {
        self.bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "bot_token is required (set it in the config file or {BOT_TOKEN_ENV})"
                ))
            })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn command_policy(&self) -> CommandPolicy {
        CommandPolicy::new(&self.forbidden_commands)
    }
}
