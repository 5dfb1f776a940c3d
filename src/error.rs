//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `ToolError` per gli errori interni dei tool (I/O, FFmpeg, validazione)
//! - Definisce `RemoveBgError`, la tassonomia dei fallimenti della pipeline iLoveImg
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori (`ToolError`):
//! - `Io`: Errori di I/O (file temporanei, permessi, etc.)
//! - `FFmpeg`: ffmpeg/ffprobe terminati con errore
//! - `MissingDependency`: Tool esterno mancante (ffmpeg, ffprobe)
//! - `Validation`: Parametri del tool non validi
//! - `Json`: Output JSON non interpretabile
//! - `Config`: Configurazione mancante o non valida
//!
//! ## Fallimenti remoti (`RemoveBgError`):
//! Un variant per ogni step della pipeline. Nessun errore di trasporto
//! (reqwest, serde) esce dal client: tutto viene normalizzato nel variant
//! dello step corrispondente.
//!
//! ## Esempio:
//! ```rust,ignore
//! if !tool_exists {
//!     return Err(ToolError::MissingDependency("ffmpeg".to_string()));
//! }
//! ```

/// Custom error types for the media tools
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FFmpeg error: {0}")]
    FFmpeg(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("{0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure of one step of the remote background-removal pipeline
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoveBgError {
    #[error("Failed to get access token: {0}")]
    Auth(String),

    #[error("Failed to upload image: {0}")]
    Upload(String),

    #[error("Failed to create remove background task: {0}")]
    TaskCreation(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("Task polling timeout after {attempts} attempts")]
    TaskTimeout { attempts: u32 },

    #[error("Failed to download result: {0}")]
    Download(String),
}

impl RemoveBgError {
    /// Short message naming the step that failed, for user-facing output
    pub fn summary(&self) -> &'static str {
        match self {
            RemoveBgError::Auth(_) => "Failed to get access token",
            RemoveBgError::Upload(_) => "Failed to upload image",
            RemoveBgError::TaskCreation(_) => "Failed to create remove background task",
            RemoveBgError::TaskFailed(_) | RemoveBgError::TaskTimeout { .. } => {
                "Task processing failed or timeout"
            }
            RemoveBgError::Download(_) => "Failed to download result",
        }
    }
}
