// Request log sinks - one record per accepted analysis request

use super::config::RequestLogSettings;
use super::types::AnalysisMode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// What gets recorded about a request; never the image itself
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestLogEntry {
    pub timestamp: String,
    pub query: String,
    pub mode: AnalysisMode,
    pub image_bytes: usize,
}

impl RequestLogEntry {
    pub fn new(query: impl Into<String>, mode: AnalysisMode, image_bytes: usize) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            query: query.into(),
            mode,
            image_bytes,
        }
    }
}

/// Destination for request records. Failures are reported to the caller,
/// which is expected to ignore them.
#[async_trait]
pub trait RequestLog: Send + Sync {
    async fn record(&self, entry: &RequestLogEntry) -> Result<(), RequestLogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RequestLogError {
    #[error("Failed to write request log {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Failed to encode request log entry: {0}")]
    Encode(String),
}

/// Emits each request as an `info` event
#[derive(Debug, Default)]
pub struct TracingRequestLog;

#[async_trait]
impl RequestLog for TracingRequestLog {
    async fn record(&self, entry: &RequestLogEntry) -> Result<(), RequestLogError> {
        tracing::info!(
            mode = %entry.mode,
            image_bytes = entry.image_bytes,
            query = %entry.query,
            "Analysis request"
        );
        Ok(())
    }
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullRequestLog;

#[async_trait]
impl RequestLog for NullRequestLog {
    async fn record(&self, _entry: &RequestLogEntry) -> Result<(), RequestLogError> {
        Ok(())
    }
}

/// Appends one compact JSON object per line
#[derive(Debug)]
pub struct JsonlRequestLog {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl JsonlRequestLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    fn io_error(&self, e: std::io::Error) -> RequestLogError {
        RequestLogError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl RequestLog for JsonlRequestLog {
    async fn record(&self, entry: &RequestLogEntry) -> Result<(), RequestLogError> {
        let mut line =
            serde_json::to_string(entry).map_err(|e| RequestLogError::Encode(e.to_string()))?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        // Keep concurrent requests from interleaving partial lines
        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

/// Pick the sink described by the configuration
pub fn from_settings(settings: &RequestLogSettings) -> Arc<dyn RequestLog> {
    match (settings.enabled, &settings.path) {
        (false, _) => Arc::new(NullRequestLog),
        (true, Some(path)) => Arc::new(JsonlRequestLog::new(path.clone())),
        (true, None) => Arc::new(TracingRequestLog),
    }
}
