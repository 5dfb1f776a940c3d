use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::transport::{ApiRequest, HttpTransport, REMOVE_BACKGROUND_TOOL};
use super::types::{
    AuthResponse, PollPolicy, ProcessedArtifact, Session, Task, TaskStatus, UploadResponse,
    UploadedAsset,
};
use crate::error::RemoveBgError;

/// Wait between two status checks
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<P: Pause + ?Sized> Pause for Arc<P> {
    async fn pause(&self, duration: Duration) {
        (**self).pause(duration).await;
    }
}

/// Drives one image through auth → upload → task → poll → download.
///
/// The session is acquired lazily and cached on the instance, so each step
/// can also be called on its own. A fresh client always starts unauthenticated.
pub struct RemoteTaskClient<T, P = TokioPause> {
    credential: String,
    transport: T,
    pause: P,
    policy: PollPolicy,
    session: Option<Session>,
}

impl<T: HttpTransport> RemoteTaskClient<T, TokioPause> {
    pub fn new(credential: impl Into<String>, transport: T) -> Self {
        Self {
            credential: credential.into(),
            transport,
            pause: TokioPause,
            policy: PollPolicy::default(),
            session: None,
        }
    }
}

impl<T: HttpTransport, P: Pause> RemoteTaskClient<T, P> {
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_pause<Q: Pause>(self, pause: Q) -> RemoteTaskClient<T, Q> {
        RemoteTaskClient {
            credential: self.credential,
            transport: self.transport,
            pause,
            policy: self.policy,
            session: self.session,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Run the full pipeline, stopping at the first failed step
    pub async fn process(
        &mut self,
        image: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<ProcessedArtifact, RemoveBgError> {
        info!("Removing background from {} ({} bytes)", filename, image.len());

        self.ensure_session().await?;
        let asset = self.upload(image, filename, mime_type).await?;
        let task = self.submit_task(asset).await?;
        let finished = self.poll_until_done(&task).await?;
        let data = self.download(&finished).await?;

        info!("Background removal finished for {} ({} bytes)", filename, data.len());
        Ok(ProcessedArtifact::new(data, filename))
    }

    /// Exchange the credential for a fresh access token, replacing any cached one
    pub async fn authenticate(&mut self) -> Result<Session, RemoveBgError> {
        debug!("Requesting iLoveImg access token");
        let request = ApiRequest::Auth {
            public_key: self.credential.clone(),
        };
        let response: AuthResponse = self.call_json(request).await.map_err(RemoveBgError::Auth)?;

        let token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| RemoveBgError::Auth("response has no access_token".to_string()))?;

        let session = Session::new(token);
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Cached session, or authenticate once
    pub async fn ensure_session(&mut self) -> Result<Session, RemoveBgError> {
        match &self.session {
            Some(session) => Ok(session.clone()),
            None => self.authenticate().await,
        }
    }

    pub async fn upload(
        &mut self,
        image: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<UploadedAsset, RemoveBgError> {
        let session = self.ensure_session().await?;
        debug!("Uploading {} as {}", filename, mime_type);

        let request = ApiRequest::Upload {
            token: session.access_token().to_string(),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            bytes: image.to_vec(),
        };
        let response: UploadResponse =
            self.call_json(request).await.map_err(RemoveBgError::Upload)?;

        let server_filename = response
            .server_filename
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RemoveBgError::Upload("response has no server_filename".to_string()))?;

        Ok(UploadedAsset { server_filename })
    }

    pub async fn submit_task(&mut self, asset: UploadedAsset) -> Result<Task, RemoveBgError> {
        let session = self.ensure_session().await?;
        debug!("Creating {} task for {}", REMOVE_BACKGROUND_TOOL, asset.server_filename);

        let request = ApiRequest::CreateTask {
            token: session.access_token().to_string(),
            server_filename: asset.server_filename,
            tool: REMOVE_BACKGROUND_TOOL.to_string(),
        };
        let body: serde_json::Value =
            self.call_json(request).await.map_err(RemoveBgError::TaskCreation)?;

        let id = body
            .get("task")
            .and_then(|task| task.as_str())
            .filter(|task| !task.is_empty())
            .map(str::to_string)
            .ok_or_else(|| RemoveBgError::TaskCreation("response has no task id".to_string()))?;

        Ok(Task::submitted(id, body))
    }

    /// Poll the task status until it succeeds, fails, or the attempt budget runs out.
    ///
    /// A non-200 or unreadable status response ends polling with `TaskFailed`.
    pub async fn poll_until_done(&mut self, task: &Task) -> Result<Task, RemoveBgError> {
        let session = self.ensure_session().await?;
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            let request = ApiRequest::TaskStatus {
                token: session.access_token().to_string(),
                task: task.id.clone(),
            };
            let body: serde_json::Value = self
                .call_json(request)
                .await
                .map_err(|reason| RemoveBgError::TaskFailed(format!("status check failed: {reason}")))?;

            let observed = Task::observed(task.id.clone(), body);
            match observed.status {
                TaskStatus::Success => {
                    debug!("Task {} succeeded after {} checks", task.id, attempt);
                    return Ok(observed);
                }
                TaskStatus::Error => {
                    let message = observed
                        .message
                        .unwrap_or_else(|| "Unknown error".to_string());
                    warn!("Task {} failed: {}", task.id, message);
                    return Err(RemoveBgError::TaskFailed(message));
                }
                TaskStatus::Pending => {
                    debug!("Task {} still running ({}/{})", task.id, attempt, max_attempts);
                    if attempt < max_attempts {
                        self.pause.pause(self.policy.interval).await;
                    }
                }
            }
        }

        warn!("Task {} polling timeout", task.id);
        Err(RemoveBgError::TaskTimeout { attempts: max_attempts })
    }

    pub async fn download(&mut self, task: &Task) -> Result<Vec<u8>, RemoveBgError> {
        if task.status != TaskStatus::Success {
            return Err(RemoveBgError::Download(format!(
                "task {} has not succeeded",
                task.id
            )));
        }
        let reference = task
            .download
            .clone()
            .ok_or_else(|| RemoveBgError::Download("task has no download reference".to_string()))?;

        let session = self.ensure_session().await?;
        let request = ApiRequest::Download {
            token: session.access_token().to_string(),
            reference,
        };
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| RemoveBgError::Download(e.to_string()))?;

        if !response.is_ok() {
            return Err(RemoveBgError::Download(describe_status(
                response.status,
                &response.body_snippet(200),
            )));
        }
        Ok(response.body)
    }

    /// Send a request and decode a 200 JSON body; any other outcome is a reason string
    async fn call_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, String> {
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_ok() {
            return Err(describe_status(response.status, &response.body_snippet(200)));
        }
        response
            .json()
            .map_err(|e| format!("invalid JSON response: {e}"))
    }
}

fn describe_status(status: u16, body: &str) -> String {
    if body.is_empty() {
        format!("unexpected status code {status}")
    } else {
        format!("unexpected status code {status}: {body}")
    }
}
