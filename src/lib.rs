//! # Media Tools Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tool e i tipi principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri host
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom (`ToolError`, `RemoveBgError`)
//! - `ffmpeg`: Wrapper async per ffmpeg/ffprobe
//! - `iloveimg`: Client del task remoto di rimozione sfondo
//! - `message`: Messaggi text/JSON/blob e loro emissione verso l'host
//! - `platform`: Risoluzione dei comandi esterni per piattaforma
//! - `progress`: Progress bar e spinner
//! - `provider`: Verifica delle credenziali
//! - `tools`: I cinque tool
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use media_tools::{FfmpegRunner, VideoInfoParams, VideoInfoTool};
//!
//! let tool = VideoInfoTool::new(FfmpegRunner::new(2));
//! let output = tool.invoke(VideoInfoParams { video: Some(file) }).await;
//! ```

pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod iloveimg;
pub mod message;
pub mod platform;
pub mod progress;
pub mod provider;
pub mod tools;

pub use config::Config;
pub use error::{RemoveBgError, ToolError};
pub use ffmpeg::FfmpegRunner;
pub use iloveimg::{HttpTransport, RemoteTaskClient, ReqwestTransport};
pub use message::{MessageSink, ToolMessage, ToolOutput};
pub use tools::{
    Base64ImageParams, Base64ImageTool, RemoveBackgroundParams, RemoveBackgroundTool, ToolFile,
    VideoFrameListParams, VideoFrameListTool, VideoFrameParams, VideoFrameTool, VideoInfoParams,
    VideoInfoTool,
};
