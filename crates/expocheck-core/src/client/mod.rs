use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod controller;
pub mod http;
pub mod settings;

/// Submission payload for a new scan job.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRequest {
    pub path: String,
}

/// Synchronous acknowledgment returned by the backend for a submission attempt.
///
/// Any `status` other than `"started"` is an application-level rejection, not a
/// transport fault; its `message` is meant to be shown to the user verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanAck {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ScanAck {
    /// Whether the backend accepted the submission and started a job.
    pub fn started(&self) -> bool {
        self.status == "started"
    }

    /// Rejection text suitable for display, with a fallback when the backend
    /// sent no message.
    pub fn rejection_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("scan not started (status: {})", self.status))
    }
}

/// Server-owned progress snapshot for the running job; polled, never pushed.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanStatus {
    pub is_scanning: bool,
    /// Percentage in `0..=100`.
    pub progress: f32,
    pub message: String,
    /// Running count of findings detected so far; informational only.
    #[serde(default)]
    pub findings_count: usize,
    /// In-job error channel. Presence does not terminate the job; only
    /// `is_scanning == false` does.
    #[serde(default)]
    pub error: Option<String>,
}

/// One detected secret occurrence with its provenance. Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub secret_type: String,
    /// ISO-8601 timestamp of the offending commit.
    pub date: String,
    pub author: String,
    pub commit_hash: String,
    pub file_path: String,
    pub line_content: String,
}

impl Finding {
    /// Commit identifier shortened to the conventional 7 characters.
    pub fn short_commit(&self) -> &str {
        match self.commit_hash.char_indices().nth(7) {
            Some((idx, _)) => &self.commit_hash[..idx],
            None => &self.commit_hash,
        }
    }

    /// Commit date truncated to calendar-day precision.
    pub fn calendar_day(&self) -> &str {
        self.date.split('T').next().unwrap_or(&self.date)
    }
}

/// Lifecycle flag owned exclusively by the controller; everyone else only ever
/// sees a copied snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientState {
    pub is_scanning: bool,
}

/// Failures at the HTTP exchange level, distinct from application-level
/// rejections carried inside a successfully decoded [`ScanAck`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to scan backend: {reason}")]
    Connection { reason: String },
    #[error("scan backend returned HTTP {status}")]
    UnexpectedStatus { status: u16 },
    #[error("failed to decode scan backend response: {reason}")]
    Decode { reason: String },
}

/// Outbound request surface toward the scan backend.
///
/// No retries happen at this layer; every failure is surfaced immediately to
/// the caller.
#[async_trait]
pub trait ScanTransport: Send + Sync {
    /// Submit a scan for `path` and return the backend's acknowledgment.
    async fn submit_scan(&self, path: &str) -> Result<ScanAck, TransportError>;

    /// Fetch the latest progress snapshot for the running job.
    async fn get_status(&self) -> Result<ScanStatus, TransportError>;

    /// Fetch the final findings once the job has finished. Empty when clean,
    /// never null.
    async fn get_results(&self) -> Result<Vec<Finding>, TransportError>;
}

#[async_trait]
impl<T: ScanTransport + ?Sized> ScanTransport for Arc<T> {
    async fn submit_scan(&self, path: &str) -> Result<ScanAck, TransportError> {
        (**self).submit_scan(path).await
    }

    async fn get_status(&self) -> Result<ScanStatus, TransportError> {
        (**self).get_status().await
    }

    async fn get_results(&self) -> Result<Vec<Finding>, TransportError> {
        (**self).get_results().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_started_only_for_started_status() {
        let ack = ScanAck {
            status: "started".into(),
            message: None,
        };
        assert!(ack.started());

        let ack = ScanAck {
            status: "error".into(),
            message: Some("Scan already in progress".into()),
        };
        assert!(!ack.started());
        assert_eq!(ack.rejection_message(), "Scan already in progress");
    }

    #[test]
    fn rejection_message_falls_back_to_status() {
        let ack = ScanAck {
            status: "rejected".into(),
            message: None,
        };
        assert_eq!(ack.rejection_message(), "scan not started (status: rejected)");
    }

    #[test]
    fn status_decodes_without_optional_fields() {
        let status: ScanStatus = serde_json::from_str(
            r#"{"is_scanning": true, "progress": 42.0, "message": "Scanning commit 12/300"}"#,
        )
        .expect("minimal status payload should decode");
        assert!(status.is_scanning);
        assert_eq!(status.findings_count, 0);
        assert!(status.error.is_none());
    }

    #[test]
    fn short_commit_truncates_to_seven_characters() {
        let finding = sample_finding("0123456789abcdef0123456789abcdef01234567");
        assert_eq!(finding.short_commit(), "0123456");
    }

    #[test]
    fn short_commit_keeps_already_short_hashes() {
        let finding = sample_finding("abc12");
        assert_eq!(finding.short_commit(), "abc12");
    }

    #[test]
    fn calendar_day_strips_time_component() {
        let mut finding = sample_finding("abc");
        finding.date = "2024-05-01T13:37:00+02:00".into();
        assert_eq!(finding.calendar_day(), "2024-05-01");

        finding.date = "2024-05-01".into();
        assert_eq!(finding.calendar_day(), "2024-05-01");
    }

    fn sample_finding(commit: &str) -> Finding {
        Finding {
            secret_type: "AWS Access Key".into(),
            date: "2024-05-01T13:37:00Z".into(),
            author: "alice".into(),
            commit_hash: commit.into(),
            file_path: "src/config.js".into(),
            line_content: "AWS_KEY=AKIA...".into(),
        }
    }
}
