use anyhow::Result;
use chrono::Utc;
use hostwatch_common::types::Recipient;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Serialize)]
struct UsageEntry<'a> {
    timestamp: String,
    user: &'a str,
    action: &'a str,
}

/// Append-only JSON-lines record of operator activity.
///
/// Nothing here reads the file back; rotation is left to the host.
pub struct UsageLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl UsageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry. Failures are logged, never returned.
    pub async fn record(&self, user: &Recipient, action: &str) {
        if let Err(e) = self.append(user, action).await {
            tracing::warn!(
                path = %self.path.display(),
                user = %user,
                error = %e,
                "Failed to write usage log entry"
            );
        }
    }

    async fn append(&self, user: &Recipient, action: &str) -> Result<()> {
        let entry = UsageEntry {
            timestamp: Utc::now().to_rfc3339(),
            user: user.as_str(),
            action,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
