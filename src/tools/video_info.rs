//! # Video Info Tool
//!
//! Analizza un video con ffprobe e restituisce un report strutturato
//! (formato, risoluzione, stream) più un riepilogo testuale.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{ToolFile, DEFAULT_VIDEO_SUFFIX};
use crate::error::ToolError;
use crate::ffmpeg::FfmpegRunner;
use crate::message::ToolOutput;

#[derive(Debug, Clone, Default)]
pub struct VideoInfoParams {
    pub video: Option<ToolFile>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormatInfo {
    pub format_name: String,
    pub duration: f64,
    pub size: u64,
    pub bit_rate: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct Resolution {
    pub width: u64,
    pub height: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VideoStreamDetails {
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub r_frame_rate: Option<String>,
    pub display_aspect_ratio: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AudioStreamDetails {
    pub sample_rate: Option<String>,
    pub channels: Option<u64>,
    pub channel_layout: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StreamInfo {
    pub index: Option<u64>,
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoStreamDetails>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioStreamDetails>,
}

impl StreamInfo {
    pub fn from_probe(stream: &Value) -> Self {
        let text = |key: &str| stream.get(key).and_then(Value::as_str).map(str::to_string);
        let number = |key: &str| stream.get(key).and_then(Value::as_u64);
        let codec_type = text("codec_type");

        let video = (codec_type.as_deref() == Some("video")).then(|| VideoStreamDetails {
            width: number("width"),
            height: number("height"),
            r_frame_rate: text("r_frame_rate"),
            display_aspect_ratio: text("display_aspect_ratio")
                .unwrap_or_else(|| "unknown".to_string()),
        });
        let audio = (codec_type.as_deref() == Some("audio")).then(|| AudioStreamDetails {
            sample_rate: text("sample_rate"),
            channels: number("channels"),
            channel_layout: text("channel_layout").unwrap_or_else(|| "unknown".to_string()),
        });

        Self {
            index: number("index"),
            codec_type,
            codec_name: text("codec_name"),
            video,
            audio,
        }
    }

    fn is_type(&self, codec_type: &str) -> bool {
        self.codec_type.as_deref() == Some(codec_type)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VideoInfoReport {
    pub status: String,
    pub filename: String,
    pub format: FormatInfo,
    pub resolution: Resolution,
    pub streams: Vec<StreamInfo>,
}

/// ffprobe prints most numbers as strings; accept both, default to zero
fn probe_number<T: std::str::FromStr>(value: &Value) -> Option<T> {
    match value {
        Value::String(text) => text.trim().parse().ok(),
        Value::Number(number) => number.to_string().parse().ok(),
        _ => None,
    }
}

impl VideoInfoReport {
    pub fn from_probe(filename: &str, metadata: &Value) -> Self {
        let format = &metadata["format"];
        let format = FormatInfo {
            format_name: format["format_name"]
                .as_str()
                .unwrap_or("unknown")
                .to_string(),
            duration: probe_number(&format["duration"]).unwrap_or(0.0),
            // sizes are integers, but some muxers report them as "123.0"
            size: probe_number::<f64>(&format["size"]).map(|v| v as u64).unwrap_or(0),
            bit_rate: probe_number::<f64>(&format["bit_rate"]).map(|v| v as u64).unwrap_or(0),
        };

        let streams: Vec<StreamInfo> = metadata["streams"]
            .as_array()
            .map(|streams| streams.iter().map(StreamInfo::from_probe).collect())
            .unwrap_or_default();

        let resolution = streams
            .iter()
            .find(|stream| stream.is_type("video"))
            .and_then(|stream| stream.video.as_ref())
            .map(|video| Resolution {
                width: video.width.unwrap_or(0),
                height: video.height.unwrap_or(0),
            })
            .unwrap_or_default();

        Self {
            status: "success".to_string(),
            filename: filename.to_string(),
            format,
            resolution,
            streams,
        }
    }

    pub fn summary_text(&self) -> String {
        let Some(primary) = self.streams.iter().find(|stream| stream.is_type("video")) else {
            return format!("No video streams found in {}", self.filename);
        };

        let duration = self.format.duration;
        let minutes = (duration / 60.0).floor() as u64;
        let seconds = (duration % 60.0) as u64;

        let mut lines = vec![
            format!("Video Information for {}:", self.filename),
            String::new(),
            format!("Format: {}", self.format.format_name),
            format!("Duration: {}m {}s", minutes, seconds),
            format!("Size: {:.2} MB", self.format.size as f64 / (1024.0 * 1024.0)),
        ];

        if let Some(VideoStreamDetails {
            width: Some(width),
            height: Some(height),
            ..
        }) = primary.video
        {
            lines.push(format!("Resolution: {}x{}", width, height));
        }

        lines.push(format!(
            "Video Codec: {}",
            primary.codec_name.as_deref().unwrap_or("Unknown")
        ));

        if let Some(audio) = self.streams.iter().find(|stream| stream.is_type("audio")) {
            lines.push(format!(
                "Audio Codec: {}",
                audio.codec_name.as_deref().unwrap_or("Unknown")
            ));
        }

        lines.push(format!("Bitrate: {:.2} kbps", self.format.bit_rate as f64 / 1000.0));

        lines.join("\n")
    }
}

/// Turn raw ffprobe output into a report, or the error message to show
pub fn interpret_probe(
    filename: &str,
    success: bool,
    stdout: &str,
    stderr: &str,
) -> Result<VideoInfoReport, String> {
    if !success {
        return Err(format!("Error analyzing video file: {}", stderr));
    }
    if stdout.trim().is_empty() {
        return Err("ffprobe returned empty output".to_string());
    }
    let metadata: Value = serde_json::from_str(stdout)
        .map_err(|e| format!("Failed to parse ffprobe output as JSON: {}", e))?;
    Ok(VideoInfoReport::from_probe(filename, &metadata))
}

pub struct VideoInfoTool {
    runner: FfmpegRunner,
}

impl VideoInfoTool {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }

    pub async fn invoke(&self, params: VideoInfoParams) -> ToolOutput {
        let Some(video) = params.video else {
            return ToolOutput::failure("No video file provided");
        };

        match self.analyze(&video).await {
            Ok(output) => output,
            Err(e) => ToolOutput::failure(format!("Error processing video file: {}", e)),
        }
    }

    async fn analyze(&self, video: &ToolFile) -> Result<ToolOutput, ToolError> {
        let input = video.write_temp(DEFAULT_VIDEO_SUFFIX).await?;
        let probe = self.runner.probe_full(input.path()).await?;
        debug!("ffprobe finished for {} (success: {})", video.filename, probe.success);

        let report = match interpret_probe(&video.filename, probe.success, &probe.stdout, &probe.stderr) {
            Ok(report) => report,
            Err(message) => return Ok(ToolOutput::failure(message)),
        };

        let mut output = ToolOutput::new();
        output
            .text(report.summary_text())
            .json(serde_json::to_value(&report)?);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_probe() -> Value {
        json!({
            "streams": [
                {
                    "index": 0,
                    "codec_name": "h264",
                    "codec_type": "video",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "30/1",
                    "display_aspect_ratio": "16:9"
                },
                {
                    "index": 1,
                    "codec_name": "aac",
                    "codec_type": "audio",
                    "sample_rate": "48000",
                    "channels": 2
                }
            ],
            "format": {
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                "duration": "125.400000",
                "size": "10485760",
                "bit_rate": "668958"
            }
        })
    }

    #[test]
    fn test_report_from_probe() {
        let report = VideoInfoReport::from_probe("clip.mp4", &sample_probe());

        assert_eq!(report.format.format_name, "mov,mp4,m4a,3gp,3g2,mj2");
        assert_eq!(report.format.duration, 125.4);
        assert_eq!(report.format.size, 10_485_760);
        assert_eq!(report.format.bit_rate, 668_958);
        assert_eq!(report.resolution, Resolution { width: 1920, height: 1080 });
        assert_eq!(report.streams.len(), 2);

        let audio = report.streams[1].audio.as_ref().unwrap();
        assert_eq!(audio.channel_layout, "unknown");
        assert_eq!(audio.channels, Some(2));
    }

    #[test]
    fn test_report_serialization_flattens_details() {
        let report = VideoInfoReport::from_probe("clip.mp4", &sample_probe());
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["streams"][0]["width"], 1920);
        assert_eq!(value["streams"][0]["display_aspect_ratio"], "16:9");
        assert_eq!(value["streams"][1]["sample_rate"], "48000");
        assert!(value["streams"][1].get("width").is_none());
        assert!(value["streams"][0].get("channels").is_none());
    }

    #[test]
    fn test_summary_text() {
        let report = VideoInfoReport::from_probe("clip.mp4", &sample_probe());
        assert_eq!(
            report.summary_text(),
            "Video Information for clip.mp4:\n\
             \n\
             Format: mov,mp4,m4a,3gp,3g2,mj2\n\
             Duration: 2m 5s\n\
             Size: 10.00 MB\n\
             Resolution: 1920x1080\n\
             Video Codec: h264\n\
             Audio Codec: aac\n\
             Bitrate: 668.96 kbps"
        );
    }

    #[test]
    fn test_summary_without_video_stream() {
        let probe = json!({
            "streams": [{"index": 0, "codec_type": "audio", "codec_name": "mp3"}],
            "format": {"format_name": "mp3", "duration": "3.0"}
        });
        let report = VideoInfoReport::from_probe("song.mp3", &probe);
        assert_eq!(report.summary_text(), "No video streams found in song.mp3");
        assert_eq!(report.resolution, Resolution::default());
    }

    #[test]
    fn test_interpret_probe_failures() {
        assert_eq!(
            interpret_probe("clip.mp4", false, "", "moov atom not found"),
            Err("Error analyzing video file: moov atom not found".to_string())
        );
        assert_eq!(
            interpret_probe("clip.mp4", true, "  \n", ""),
            Err("ffprobe returned empty output".to_string())
        );

        let err = interpret_probe("clip.mp4", true, "{not json", "").unwrap_err();
        assert!(err.starts_with("Failed to parse ffprobe output as JSON: "));
        assert!(err.len() > "Failed to parse ffprobe output as JSON: ".len());
    }

    #[test]
    fn test_missing_format_fields_default() {
        let report = VideoInfoReport::from_probe("x.mp4", &json!({}));
        assert_eq!(report.format.format_name, "unknown");
        assert_eq!(report.format.duration, 0.0);
        assert_eq!(report.format.size, 0);
        assert!(report.streams.is_empty());
    }
}
