//! # iLoveImg Remote Task Module
//!
//! Client per la rimozione dello sfondo tramite API iLoveImg.
//!
//! ## Pipeline:
//! 1. `authenticate`: `GET /v1/auth?public_key=...` → access token
//! 2. `upload`: `POST /v1/upload` multipart → `server_filename`
//! 3. `submit_task`: `POST /v1/task` `{server_filename, tool: "removebg"}` → `task`
//! 4. `poll_until_done`: `GET /v1/task/{task}` ogni 2s, max 30 tentativi
//! 5. `download`: `GET` sull'URL `download` del task completato
//!
//! Il primo step fallito interrompe la pipeline e diventa il `RemoveBgError`
//! restituito. Nessun retry automatico.
//!
//! ## Sottomoduli:
//! - `client`: `RemoteTaskClient`, sessione e polling
//! - `transport`: trait `HttpTransport` e implementazione `reqwest`
//! - `types`: Session, Task, ProcessedArtifact, PollPolicy

pub mod client;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{Pause, RemoteTaskClient, TokioPause};
pub use transport::{
    ApiRequest, ApiResponse, Endpoints, HttpTransport, RequestKind, ReqwestTransport, Timeouts,
    TransportError,
};
pub use types::{PollPolicy, ProcessedArtifact, Session, Task, TaskStatus, UploadedAsset};

use std::time::Duration;

use crate::config::Config;

/// Production client for `credential`, wired from the configuration
pub fn client_from_config(
    config: &Config,
    credential: &str,
) -> Result<RemoteTaskClient<ReqwestTransport>, TransportError> {
    let transport = ReqwestTransport::new(
        Endpoints::new(config.api_base_url.clone()),
        Timeouts {
            short: Duration::from_secs(config.auth_timeout_secs),
            transfer: Duration::from_secs(config.transfer_timeout_secs),
        },
    )?;
    Ok(RemoteTaskClient::new(credential, transport).with_policy(config.poll_policy()))
}
