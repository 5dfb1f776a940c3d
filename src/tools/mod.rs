//! # Tools Module
//!
//! Ogni tool è un adapter stateless: valida pochi parametri, delega il lavoro
//! a ffmpeg/ffprobe o all'API iLoveImg, e impacchetta il risultato in una
//! sequenza di `ToolMessage` (text, JSON, blob).
//!
//! ## Tool disponibili:
//! - `video_frame`: un frame JPEG a inizio, fine o a un tempo dato
//! - `video_frame_list`: fino a 100 frame distanziati di `gap_time`
//! - `video_info`: metadata di formato e stream via ffprobe
//! - `base64_image`: decodifica di stringhe base64 / data URL in immagini
//! - `remove_background`: rimozione sfondo tramite iLoveImg
//!
//! ## Gestione errori:
//! I tool non restituiscono mai `Err` all'host: ogni fallimento diventa un
//! messaggio di testo seguito da `{"status": "error", "message": ...}`.

pub mod base64_image;
pub mod remove_background;
pub mod video_frame;
pub mod video_frame_list;
pub mod video_info;

pub use base64_image::{Base64ImageParams, Base64ImageTool};
pub use remove_background::{RemoveBackgroundParams, RemoveBackgroundTool};
pub use video_frame::{FrameSelection, VideoFrameParams, VideoFrameTool};
pub use video_frame_list::{VideoFrameListParams, VideoFrameListTool};
pub use video_info::{VideoInfoParams, VideoInfoTool};

use crate::error::ToolError;
use std::path::Path;
use tempfile::NamedTempFile;

/// Default suffix for video inputs that come without an extension
pub const DEFAULT_VIDEO_SUFFIX: &str = ".mp4";

/// A file handed to a tool by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFile {
    pub filename: String,
    /// Extension with its leading dot, e.g. `.mp4`
    pub extension: Option<String>,
    pub mime_type: String,
    pub blob: Vec<u8>,
}

impl ToolFile {
    pub fn new(filename: impl Into<String>, blob: Vec<u8>) -> Self {
        let filename = filename.into();
        let extension = Path::new(&filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()));
        let mime_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            filename,
            extension,
            mime_type,
            blob,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    pub async fn from_path(path: &Path) -> Result<Self, ToolError> {
        let blob = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| ToolError::Validation(format!("Not a file: {}", path.display())))?;
        Ok(Self::new(filename, blob))
    }

    /// Filename without its extension
    pub fn stem(&self) -> String {
        Path::new(&self.filename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| self.filename.clone())
    }

    /// Copy the blob into a temp file that keeps this file's extension.
    /// The file is removed when the returned handle drops.
    pub async fn write_temp(&self, default_suffix: &str) -> Result<NamedTempFile, ToolError> {
        let suffix = self.extension.as_deref().unwrap_or(default_suffix);
        let temp = tempfile::Builder::new()
            .prefix("media-tools-")
            .suffix(suffix)
            .tempfile()?;
        tokio::fs::write(temp.path(), &self.blob).await?;
        Ok(temp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_file_metadata() {
        let file = ToolFile::new("holiday.clip.mp4", vec![0; 4]);
        assert_eq!(file.extension.as_deref(), Some(".mp4"));
        assert_eq!(file.mime_type, "video/mp4");
        assert_eq!(file.stem(), "holiday.clip");

        let file = ToolFile::new("README", vec![]);
        assert!(file.extension.is_none());
        assert_eq!(file.mime_type, "application/octet-stream");
        assert_eq!(file.stem(), "README");
    }

    #[tokio::test]
    async fn test_write_temp_keeps_suffix_and_cleans_up() {
        let file = ToolFile::new("clip.mov", b"data".to_vec());
        let temp = file.write_temp(DEFAULT_VIDEO_SUFFIX).await.unwrap();
        let path = temp.path().to_path_buf();

        assert!(path.to_string_lossy().ends_with(".mov"));
        assert_eq!(std::fs::read(&path).unwrap(), b"data");

        drop(temp);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_write_temp_default_suffix() {
        let file = ToolFile::new("clip", b"data".to_vec());
        let temp = file.write_temp(DEFAULT_VIDEO_SUFFIX).await.unwrap();
        assert!(temp.path().to_string_lossy().ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let file = ToolFile::from_path(&path).await.unwrap();
        assert_eq!(file.filename, "cat.png");
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.blob, b"\x89PNG");
    }
}
