//! # Video Frame List Tool
//!
//! Estrae più frame JPEG distanziati di `gap_time` secondi.
//!
//! ## Piano dei tempi:
//! - `count == 1`: un solo frame a metà video
//! - `count * gap_time > durata`: il gap viene ridotto a `durata / count`
//! - tempi `i * gap_time` per `i in 0..count`, scartando quelli oltre la durata
//!
//! Un frame fallito produce solo un messaggio di testo; l'estrazione continua.

use serde::Serialize;
use serde_json::json;
use tempfile::TempDir;
use tracing::{debug, warn};

use super::{ToolFile, DEFAULT_VIDEO_SUFFIX};
use crate::error::ToolError;
use crate::ffmpeg::FfmpegRunner;
use crate::message::ToolOutput;
use crate::progress::ProgressManager;
use crate::tools::video_frame::FRAME_MIME_TYPE;

pub const DEFAULT_MAX_FRAME_COUNT: u32 = 100;

#[derive(Debug, Clone)]
pub struct VideoFrameListParams {
    pub video: Option<ToolFile>,
    pub gap_time: String,
    pub count: String,
}

impl Default for VideoFrameListParams {
    fn default() -> Self {
        Self {
            video: None,
            gap_time: "1".to_string(),
            count: "1".to_string(),
        }
    }
}

pub fn parse_gap_time(value: &str) -> Result<f64, String> {
    let gap_time = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|gap| gap.is_finite())
        .ok_or_else(|| "Invalid gap time parameter. Must be a number".to_string())?;
    if gap_time <= 0.0 {
        return Err("Gap time must be positive".to_string());
    }
    Ok(gap_time)
}

pub fn parse_count(value: &str, max_count: u32) -> Result<u32, String> {
    let count = value
        .trim()
        .parse::<i64>()
        .map_err(|_| "Invalid count parameter. Must be an integer".to_string())?;
    if count <= 0 {
        return Err("Count must be positive".to_string());
    }
    if count > i64::from(max_count) {
        return Err(format!("Count cannot exceed {}", max_count));
    }
    Ok(count as u32)
}

/// Seek times for a frame list, with the gap actually used
#[derive(Debug, Clone, PartialEq)]
pub struct SeekPlan {
    pub gap_time: f64,
    pub seek_times: Vec<f64>,
}

pub fn plan_seek_times(duration: f64, gap_time: f64, count: u32) -> SeekPlan {
    if count == 1 {
        return SeekPlan {
            gap_time,
            seek_times: vec![duration / 2.0],
        };
    }

    let gap_time = if f64::from(count) * gap_time > duration {
        duration / f64::from(count)
    } else {
        gap_time
    };

    let seek_times = (0..count)
        .map(|i| f64::from(i) * gap_time)
        .filter(|seek_time| *seek_time < duration)
        .collect();

    SeekPlan {
        gap_time,
        seek_times,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExtractedFrame {
    pub frame_number: usize,
    pub filename: String,
    pub seek_time: f64,
    pub frame_size: usize,
}

pub fn frame_filename(stem: &str, frame_number: usize) -> String {
    format!("{}_frame_{:03}.jpg", stem, frame_number)
}

pub struct VideoFrameListTool {
    runner: FfmpegRunner,
    max_count: u32,
    show_progress: bool,
}

impl VideoFrameListTool {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self {
            runner,
            max_count: DEFAULT_MAX_FRAME_COUNT,
            show_progress: false,
        }
    }

    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn invoke(&self, params: VideoFrameListParams) -> ToolOutput {
        let Some(video) = params.video else {
            return ToolOutput::failure("No video file provided");
        };

        let gap_time = match parse_gap_time(&params.gap_time) {
            Ok(gap_time) => gap_time,
            Err(message) => return ToolOutput::failure(message),
        };
        let count = match parse_count(&params.count, self.max_count) {
            Ok(count) => count,
            Err(message) => return ToolOutput::failure(message),
        };

        match self.extract(&video, gap_time, count).await {
            Ok(output) => output,
            Err(e) => ToolOutput::failure(format!("Error processing video file: {}", e)),
        }
    }

    async fn extract(
        &self,
        video: &ToolFile,
        gap_time: f64,
        count: u32,
    ) -> Result<ToolOutput, ToolError> {
        let input = video.write_temp(DEFAULT_VIDEO_SUFFIX).await?;

        let duration = match self.runner.probe_duration(input.path()).await {
            Ok(duration) => duration,
            Err(ToolError::FFmpeg(stderr)) => {
                return Ok(ToolOutput::failure(format!(
                    "Failed to get video duration: {}",
                    stderr
                )));
            }
            Err(e) => return Err(e),
        };
        if duration <= 0.0 {
            return Ok(ToolOutput::failure("Invalid video duration"));
        }

        let plan = plan_seek_times(duration, gap_time, count);
        debug!(
            "Frame plan for {}: {} frames, gap {:.3}s, duration {:.3}s",
            video.filename,
            plan.seek_times.len(),
            plan.gap_time,
            duration
        );

        let mut output = ToolOutput::new();
        output.text(format!("Extracting {} frames from video...", plan.seek_times.len()));

        let work_dir = TempDir::new()?;
        let stem = video.stem();
        let progress = ProgressManager::new(plan.seek_times.len() as u64, self.show_progress);
        let mut frames = Vec::with_capacity(plan.seek_times.len());

        for (index, seek_time) in plan.seek_times.iter().copied().enumerate() {
            let frame_number = index + 1;
            let filename = frame_filename(&stem, frame_number);
            let frame_path = work_dir.path().join(&filename);

            let failure = match self.runner.extract_frame(input.path(), seek_time, &frame_path).await {
                Ok(()) => None,
                Err(ToolError::FFmpeg(stderr)) => Some(stderr),
                Err(e) => {
                    progress.finish("aborted");
                    output.error(format!("Error processing video file: {}", e));
                    return Ok(output);
                }
            };

            match failure {
                None if frame_path.exists() => {
                    let frame_data = tokio::fs::read(&frame_path).await?;
                    let frame_size = frame_data.len();
                    output.blob(filename.clone(), FRAME_MIME_TYPE, frame_data);
                    tokio::fs::remove_file(&frame_path).await?;

                    frames.push(ExtractedFrame {
                        frame_number,
                        filename: filename.clone(),
                        seek_time,
                        frame_size,
                    });
                }
                failure => {
                    warn!("Frame {} of {} failed at {:.2}s", frame_number, video.filename, seek_time);
                    output.text(format!(
                        "Failed to extract frame at {:.2}s: {}",
                        seek_time,
                        failure.unwrap_or_default()
                    ));
                }
            }
            progress.update(&filename);
        }
        progress.finish(&format!("{} frames extracted", frames.len()));

        output
            .json(json!({
                "status": "success",
                "message": format!("Successfully extracted {} frames from video", frames.len()),
                "original_filename": video.filename,
                "video_duration": duration,
                "gap_time": plan.gap_time,
                "requested_count": count,
                "extracted_count": frames.len(),
                "frames": frames,
            }))
            .text(format!(
                "Successfully extracted {} frames from {}.",
                frames.len(),
                video.filename
            ));

        Ok(output)
    }
}
