use serde::Deserialize;
use std::time::Duration;

/// Output MIME type of the remove-background tool
pub const PROCESSED_MIME_TYPE: &str = "image/png";

/// Bearer token obtained from `/v1/auth`
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("access_token", &"<redacted>").finish()
    }
}

/// Server-side handle of an uploaded image. Not `Clone`: task creation consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct UploadedAsset {
    pub server_filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Success,
    Error,
}

impl TaskStatus {
    /// `"Success"` and `"Error"` are terminal; anything else is still running
    pub fn from_api(status: Option<&str>) -> Self {
        match status {
            Some("Success") => TaskStatus::Success,
            Some("Error") => TaskStatus::Error,
            _ => TaskStatus::Pending,
        }
    }
}

/// A remote processing job as last observed
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    /// Server message, set on `Error`
    pub message: Option<String>,
    /// Download URL or id, set on `Success`
    pub download: Option<String>,
    /// Full body of the last status response
    pub body: serde_json::Value,
}

impl Task {
    /// A freshly created task that has not been polled yet
    pub fn submitted(id: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Pending,
            message: None,
            download: None,
            body,
        }
    }

    /// Interpret a `/v1/task/{task}` response body
    pub fn observed(id: impl Into<String>, body: serde_json::Value) -> Self {
        let text = |key: &str| {
            body.get(key)
                .and_then(|value| value.as_str())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let status = TaskStatus::from_api(body.get("status").and_then(|value| value.as_str()));
        let message = text("message");
        let download = text("download");

        Self {
            id: id.into(),
            status,
            message,
            download,
            body,
        }
    }
}

/// Final result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedArtifact {
    pub data: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub original_filename: String,
}

impl ProcessedArtifact {
    pub fn new(data: Vec<u8>, original_filename: &str) -> Self {
        Self {
            data,
            filename: processed_filename(original_filename),
            mime_type: PROCESSED_MIME_TYPE.to_string(),
            original_filename: original_filename.to_string(),
        }
    }
}

pub fn processed_filename(original_filename: &str) -> String {
    format!("removed_background_{}", original_filename)
}

/// Bounds of the status polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(2),
        }
    }
}

impl PollPolicy {
    /// Longest time a stuck task can hold the caller
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub server_filename: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        assert_eq!(TaskStatus::from_api(Some("Success")), TaskStatus::Success);
        assert_eq!(TaskStatus::from_api(Some("Error")), TaskStatus::Error);
        assert_eq!(TaskStatus::from_api(Some("Processing")), TaskStatus::Pending);
        assert_eq!(TaskStatus::from_api(None), TaskStatus::Pending);
        // status strings are case sensitive on the API side
        assert_eq!(TaskStatus::from_api(Some("success")), TaskStatus::Pending);
    }

    #[test]
    fn test_observed_task_fields() {
        let task = Task::observed("tk1", json!({"status": "Success", "download": "https://dl/x"}));
        assert_eq!(task.status, TaskStatus::Success);
        assert_eq!(task.download.as_deref(), Some("https://dl/x"));
        assert!(task.message.is_none());

        let task = Task::observed("tk1", json!({"status": "Error", "message": "bad input"}));
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.message.as_deref(), Some("bad input"));
    }

    #[test]
    fn test_artifact_naming() {
        let artifact = ProcessedArtifact::new(b"RESULT".to_vec(), "cat.png");
        assert_eq!(artifact.filename, "removed_background_cat.png");
        assert_eq!(artifact.mime_type, "image/png");
        assert_eq!(artifact.original_filename, "cat.png");
    }

    #[test]
    fn test_poll_ceiling() {
        assert_eq!(PollPolicy::default().ceiling(), Duration::from_secs(60));
    }
}
