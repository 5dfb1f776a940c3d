//! HTTP transport for the iLoveImg client.
//!
//! The client speaks in `ApiRequest`s and gets back raw `ApiResponse`s; status
//! and body interpretation stay in the client. `ReqwestTransport` is the
//! production implementation, tests script their own.

use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Tool name sent on task creation
pub const REMOVE_BACKGROUND_TOOL: &str = "removebg";

/// The five calls of the remote workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Auth,
    Upload,
    CreateTask,
    TaskStatus,
    Download,
}

impl RequestKind {
    /// Upload, task creation and download move payloads and get the long timeout
    pub fn is_transfer(self) -> bool {
        matches!(self, RequestKind::Upload | RequestKind::CreateTask | RequestKind::Download)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum ApiRequest {
    Auth {
        public_key: String,
    },
    Upload {
        token: String,
        filename: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
    CreateTask {
        token: String,
        server_filename: String,
        tool: String,
    },
    TaskStatus {
        token: String,
        task: String,
    },
    /// `reference` is the `download` value of a successful task: a URL or a bare id
    Download {
        token: String,
        reference: String,
    },
}

impl ApiRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            ApiRequest::Auth { .. } => RequestKind::Auth,
            ApiRequest::Upload { .. } => RequestKind::Upload,
            ApiRequest::CreateTask { .. } => RequestKind::CreateTask,
            ApiRequest::TaskStatus { .. } => RequestKind::TaskStatus,
            ApiRequest::Download { .. } => RequestKind::Download,
        }
    }
}

// Keys, tokens and image bytes stay out of logs.
impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiRequest::Auth { .. } => f.write_str("Auth"),
            ApiRequest::Upload { filename, mime_type, bytes, .. } => f
                .debug_struct("Upload")
                .field("filename", filename)
                .field("mime_type", mime_type)
                .field("bytes", &bytes.len())
                .finish(),
            ApiRequest::CreateTask { server_filename, tool, .. } => f
                .debug_struct("CreateTask")
                .field("server_filename", server_filename)
                .field("tool", tool)
                .finish(),
            ApiRequest::TaskStatus { task, .. } => {
                f.debug_struct("TaskStatus").field("task", task).finish()
            }
            ApiRequest::Download { reference, .. } => {
                f.debug_struct("Download").field("reference", reference).finish()
            }
        }
    }
}

/// Status code and raw body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    /// A 200 response with a JSON body
    pub fn json_ok(value: serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body as text, cut to `max` characters
    pub fn body_snippet(&self, max: usize) -> String {
        let text = String::from_utf8_lossy(&self.body);
        let trimmed = text.trim();
        if trimmed.chars().count() <= max {
            trimmed.to_string()
        } else {
            let cut: String = trimmed.chars().take(max).collect();
            format!("{cut}...")
        }
    }
}

/// Network-level failure: connection, timeout, TLS, request building
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        TransportError(value.to_string())
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Fixed endpoint layout under a base URL
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn auth_url(&self) -> String {
        format!("{}/v1/auth", self.base_url)
    }

    pub fn upload_url(&self) -> String {
        format!("{}/v1/upload", self.base_url)
    }

    pub fn task_url(&self) -> String {
        format!("{}/v1/task", self.base_url)
    }

    pub fn task_status_url(&self, task: &str) -> String {
        format!("{}/v1/task/{}", self.base_url, task)
    }

    /// Absolute URLs are used as given, bare ids go under `/v1/download/`
    pub fn download_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            reference.to_string()
        } else {
            format!("{}/v1/download/{}", self.base_url, reference.trim_start_matches('/'))
        }
    }
}

/// Per-class request timeouts
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Auth and task status checks
    pub short: Duration,
    /// Upload, task creation and download
    pub transfer: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(10),
            transfer: Duration::from_secs(30),
        }
    }
}

impl Timeouts {
    pub fn for_kind(&self, kind: RequestKind) -> Duration {
        if kind.is_transfer() {
            self.transfer
        } else {
            self.short
        }
    }
}

/// `reqwest`-backed transport against the real API
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    endpoints: Endpoints,
    timeouts: Timeouts,
}

impl ReqwestTransport {
    pub fn new(endpoints: Endpoints, timeouts: Timeouts) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_client(http, endpoints, timeouts))
    }

    pub fn with_client(http: reqwest::Client, endpoints: Endpoints, timeouts: Timeouts) -> Self {
        Self { http, endpoints, timeouts }
    }

    fn build(&self, request: ApiRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let builder = match request {
            ApiRequest::Auth { public_key } => self
                .http
                .get(self.endpoints.auth_url())
                .query(&[("public_key", public_key)]),
            ApiRequest::Upload { token, filename, mime_type, bytes } => {
                let part = multipart::Part::bytes(bytes)
                    .file_name(filename)
                    .mime_str(&mime_type)?;
                let form = multipart::Form::new().part("file", part);
                self.http
                    .post(self.endpoints.upload_url())
                    .bearer_auth(token)
                    .multipart(form)
            }
            ApiRequest::CreateTask { token, server_filename, tool } => self
                .http
                .post(self.endpoints.task_url())
                .bearer_auth(token)
                .json(&serde_json::json!({
                    "server_filename": server_filename,
                    "tool": tool,
                })),
            ApiRequest::TaskStatus { token, task } => self
                .http
                .get(self.endpoints.task_status_url(&task))
                .bearer_auth(token),
            ApiRequest::Download { token, reference } => self
                .http
                .get(self.endpoints.download_url(&reference))
                .bearer_auth(token),
        };
        Ok(builder)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let kind = request.kind();
        debug!("iLoveImg request: {:?}", request);

        let response = self
            .build(request)?
            .timeout(self.timeouts.for_kind(kind))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("iLoveImg {:?} -> HTTP {} ({} bytes)", kind, status, body.len());

        Ok(ApiResponse { status, body })
    }
}
