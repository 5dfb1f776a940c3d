//! # FFmpeg Runner Module
//!
//! Questo modulo incapsula tutte le chiamate a `ffmpeg` e `ffprobe`.
//!
//! ## Responsabilità:
//! - Estrazione di un singolo frame JPEG a un timestamp dato
//! - Lettura della durata del video (`ffprobe -show_format`)
//! - Probe completo di formato e stream (`ffprobe -show_format -show_streams`)
//! - Verifica dipendenze esterne (ffmpeg, ffprobe)
//!
//! ## Comandi:
//! ```text
//! ffprobe -v quiet -print_format json -show_format <input>
//! ffprobe -v error -print_format json -show_format -show_streams <input>
//! ffmpeg -i <input> -ss <t> -vframes 1 -q:v 2 -y <output>
//! ```
//!
//! Nessuna decodifica avviene in-process: tutto il lavoro è delegato ai binari.

use crate::error::ToolError;
use crate::platform::PlatformCommands;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Raw result of an ffprobe run, left for the caller to classify
#[derive(Debug, Clone)]
pub struct ProbeOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Spawns ffmpeg / ffprobe
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    frame_quality: u8,
}

impl FfmpegRunner {
    /// Runner using the platform-resolved binaries
    pub fn new(frame_quality: u8) -> Self {
        let platform = PlatformCommands::instance();
        Self::with_programs(platform.program("ffmpeg"), platform.program("ffprobe"), frame_quality)
    }

    pub fn with_programs(ffmpeg: PathBuf, ffprobe: PathBuf, frame_quality: u8) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            frame_quality,
        }
    }

    async fn run(program: &Path, mut command: Command) -> Result<Output, ToolError> {
        debug!("Running {:?}", command);
        command.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::MissingDependency(format!("{} is not installed", program.display()))
            } else {
                ToolError::Io(e)
            }
        })
    }

    /// `ffprobe -show_format`; a non-zero exit yields `FFmpeg(stderr)`
    pub async fn probe_format(&self, input: &Path) -> Result<serde_json::Value, ToolError> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(input);
        let output = Self::run(&self.ffprobe, command).await?;

        if !output.status.success() {
            return Err(ToolError::FFmpeg(String::from_utf8_lossy(&output.stderr).to_string()));
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    /// Container duration in seconds; `0.0` when ffprobe does not report one
    pub async fn probe_duration(&self, input: &Path) -> Result<f64, ToolError> {
        let info = self.probe_format(input).await?;
        Ok(duration_from_probe(&info))
    }

    /// `ffprobe -show_format -show_streams` at error log level
    pub async fn probe_full(&self, input: &Path) -> Result<ProbeOutput, ToolError> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(input);
        let output = Self::run(&self.ffprobe, command).await?;

        Ok(ProbeOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Write the frame at `seek_time` seconds to `output` as JPEG
    pub async fn extract_frame(
        &self,
        input: &Path,
        seek_time: f64,
        output: &Path,
    ) -> Result<(), ToolError> {
        let mut command = Command::new(&self.ffmpeg);
        command
            .arg("-i")
            .arg(input)
            .arg("-ss")
            .arg(seek_time.to_string())
            .args(["-vframes", "1"])
            .arg("-q:v")
            .arg(self.frame_quality.to_string())
            .arg("-y")
            .arg(output);
        let result = Self::run(&self.ffmpeg, command).await?;

        if !result.status.success() {
            return Err(ToolError::FFmpeg(String::from_utf8_lossy(&result.stderr).to_string()));
        }
        Ok(())
    }

    /// Check if ffmpeg and ffprobe are available
    pub async fn check_dependencies() -> Result<(), ToolError> {
        let platform = PlatformCommands::instance();

        for tool in ["ffmpeg", "ffprobe"] {
            if !platform.is_command_available(tool).await {
                return Err(ToolError::MissingDependency(format!(
                    "{} is required for video processing",
                    tool
                )));
            }
        }

        Ok(())
    }
}

/// `format.duration` from ffprobe JSON, which reports it as a string
pub fn duration_from_probe(info: &serde_json::Value) -> f64 {
    let duration = &info["format"]["duration"];
    duration
        .as_str()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .or_else(|| duration.as_f64())
        .unwrap_or(0.0)
}
