//! # Video Frame Tool
//!
//! Estrae un singolo frame JPEG da un video.
//!
//! ## Tipi di frame:
//! - `start`: primo frame (t = 0)
//! - `end`: un secondo prima della fine (durata letta con ffprobe)
//! - `time`: al tempo indicato dal parametro `time` (secondi, >= 0)
//!
//! ## Output:
//! 1. text `Extracting frame from video...`
//! 2. blob `<nome>_frame.jpg` (`image/jpeg`)
//! 3. JSON con `seek_time` e `frame_size`
//! 4. text di conferma

use serde_json::json;
use tempfile::TempDir;
use tracing::debug;

use super::{ToolFile, DEFAULT_VIDEO_SUFFIX};
use crate::error::ToolError;
use crate::ffmpeg::FfmpegRunner;
use crate::message::ToolOutput;

pub const FRAME_MIME_TYPE: &str = "image/jpeg";

const VALID_TYPES: [&str; 3] = ["start", "end", "time"];

#[derive(Debug, Clone, PartialEq)]
pub enum FrameSelection {
    Start,
    End,
    At(f64),
}

impl FrameSelection {
    /// Validate the `type` / `time` parameter pair
    pub fn parse(frame_type: &str, time: &str) -> Result<Self, String> {
        match frame_type {
            "" => Err("No frame type specified".to_string()),
            "start" => Ok(FrameSelection::Start),
            "end" => Ok(FrameSelection::End),
            "time" => {
                let seconds = time
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| "Invalid time parameter. Must be a number".to_string())?;
                if seconds < 0.0 {
                    return Err("Time parameter must be non-negative".to_string());
                }
                Ok(FrameSelection::At(seconds))
            }
            other => Err(format!(
                "Unsupported frame type: {}. Supported types are: {}",
                other,
                VALID_TYPES.join(", ")
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FrameSelection::Start => "start",
            FrameSelection::End => "end",
            FrameSelection::At(_) => "time",
        }
    }
}

/// Seek time for `end`: one second before the end, never negative
pub fn end_seek_time(duration: f64) -> f64 {
    (duration - 1.0).max(0.0)
}

#[derive(Debug, Clone)]
pub struct VideoFrameParams {
    pub video: Option<ToolFile>,
    pub frame_type: String,
    pub time: String,
}

impl Default for VideoFrameParams {
    fn default() -> Self {
        Self {
            video: None,
            frame_type: "start".to_string(),
            time: "1".to_string(),
        }
    }
}

pub struct VideoFrameTool {
    runner: FfmpegRunner,
}

impl VideoFrameTool {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }

    pub async fn invoke(&self, params: VideoFrameParams) -> ToolOutput {
        let Some(video) = params.video else {
            return ToolOutput::failure("No video file provided");
        };

        let selection = match FrameSelection::parse(&params.frame_type, &params.time) {
            Ok(selection) => selection,
            Err(message) => return ToolOutput::failure(message),
        };

        match self.extract(&video, selection).await {
            Ok(output) => output,
            Err(e) => ToolOutput::failure(format!("Error processing video file: {}", e)),
        }
    }

    async fn extract(
        &self,
        video: &ToolFile,
        selection: FrameSelection,
    ) -> Result<ToolOutput, ToolError> {
        let input = video.write_temp(DEFAULT_VIDEO_SUFFIX).await?;
        let work_dir = TempDir::new()?;
        let frame_filename = format!("{}_frame.jpg", video.stem());
        let frame_path = work_dir.path().join(&frame_filename);

        let seek_time = match selection {
            FrameSelection::Start => 0.0,
            FrameSelection::End => match self.runner.probe_duration(input.path()).await {
                Ok(duration) => end_seek_time(duration),
                Err(ToolError::FFmpeg(stderr)) => {
                    return Ok(ToolOutput::failure(format!(
                        "Failed to get video duration: {}",
                        stderr
                    )));
                }
                Err(e) => return Err(e),
            },
            FrameSelection::At(seconds) => seconds,
        };
        debug!("Extracting {} frame of {} at {}s", selection.name(), video.filename, seek_time);

        let mut output = ToolOutput::new();
        output.text("Extracting frame from video...");

        match self
            .runner
            .extract_frame(input.path(), seek_time, &frame_path)
            .await
        {
            Ok(()) => {}
            Err(ToolError::FFmpeg(stderr)) => {
                output.error(format!("Failed to extract video frame: {}", stderr));
                return Ok(output);
            }
            Err(e) => {
                output.error(format!("Error processing video file: {}", e));
                return Ok(output);
            }
        }

        if !frame_path.exists() {
            output.error("Extracted frame file does not exist");
            return Ok(output);
        }

        let frame_data = tokio::fs::read(&frame_path).await?;
        let frame_size = frame_data.len();

        output
            .blob(frame_filename.clone(), FRAME_MIME_TYPE, frame_data)
            .json(json!({
                "status": "success",
                "message": "Successfully extracted frame from video",
                "original_filename": video.filename,
                "frame_filename": frame_filename,
                "frame_type": selection.name(),
                "seek_time": seek_time,
                "frame_size": frame_size,
            }))
            .text(format!(
                "Successfully extracted frame from {} at {:.2}s.",
                video.filename, seek_time
            ));

        Ok(output)
    }
}
