use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use url::Url;
use vigil_config::AuditConfig;

use crate::entry::AuditEntry;

/// Timeout for the SIEM webhook POST
const SIEM_TIMEOUT: Duration = Duration::from_secs(3);

struct LogInner {
    recent: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
    shipper: Option<mpsc::UnboundedSender<AuditEntry>>,
}

/// Shared audit log handle
///
/// Cloning is cheap and shares the ring buffer and shipper task.
#[derive(Clone)]
pub struct AuditLog {
    inner: Arc<LogInner>,
}

impl AuditLog {
    /// Build the log and spawn the background shipper when a file or
    /// webhook sink is configured
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: &AuditConfig) -> Self {
        let shipper = if config.log_file.is_some() || config.siem_webhook_url.is_some() {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(ship_entries(rx, config.log_file.clone(), config.siem_webhook_url.clone()));
            Some(tx)
        } else {
            None
        };

        Self {
            inner: Arc::new(LogInner {
                recent: Mutex::new(VecDeque::with_capacity(config.recent_capacity.min(1024))),
                capacity: config.recent_capacity,
                shipper,
            }),
        }
    }

    /// Record an entry, best effort
    ///
    /// Appends to the in-memory ring synchronously and hands the entry to
    /// the shipper task. Never blocks on I/O and never fails the caller.
    pub fn record(&self, entry: AuditEntry) {
        if self.inner.capacity > 0 {
            let mut recent = self.inner.recent.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            while recent.len() >= self.inner.capacity {
                recent.pop_front();
            }
            recent.push_back(entry.clone());
        }

        if let Some(shipper) = &self.inner.shipper
            && shipper.send(entry).is_err()
        {
            tracing::warn!("audit shipper task is gone, entry kept in memory only");
        }
    }

    /// Last `limit` entries, most recent first
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let recent = self.inner.recent.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        recent.iter().rev().take(limit).cloned().collect()
    }
}

/// Drain the channel, appending each entry to the JSONL file and posting
/// it to the SIEM webhook; sink errors are logged and swallowed
async fn ship_entries(mut rx: mpsc::UnboundedReceiver<AuditEntry>, log_file: Option<PathBuf>, siem_url: Option<Url>) {
    let client = siem_url.as_ref().map(|_| {
        reqwest::Client::builder()
            .timeout(SIEM_TIMEOUT)
            .build()
            .unwrap_or_default()
    });

    while let Some(entry) = rx.recv().await {
        if let Some(path) = &log_file
            && let Err(e) = append_jsonl(path, &entry).await
        {
            tracing::warn!(path = %path.display(), error = %e, "failed to append audit entry");
        }

        if let (Some(url), Some(client)) = (&siem_url, &client)
            && let Err(e) = client.post(url.clone()).json(&entry).send().await
        {
            // SIEM unavailability must never impact request handling
            tracing::warn!(error = %e, "failed to ship audit entry to SIEM webhook");
        }
    }
}

/// Append one entry as a JSON line, creating parent directories as needed
async fn append_jsonl(path: &PathBuf, entry: &AuditEntry) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut line = serde_json::to_string(entry).map_err(std::io::Error::other)?;
    line.push('\n');

    let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}
