//! # Tool Message Module
//!
//! Questo modulo definisce i messaggi prodotti dai tool e il loro output verso l'host.
//!
//! ## Responsabilità:
//! - `ToolMessage`: i tre tipi di messaggio (text, JSON, blob)
//! - `ToolOutput`: sequenza ordinata di messaggi di una singola invocazione
//! - `MessageSink`: emette ogni messaggio come riga JSON su stdout e salva i blob su disco
//!
//! ## Formato righe JSON:
//! ```json
//! {"type":"text","text":"Extracting frame from video..."}
//! {"type":"blob","filename":"clip_frame.jpg","mime_type":"image/jpeg","size":48213,"path":"out/clip_frame.jpg"}
//! {"type":"json","data":{"status":"success","message":"..."}}
//! ```

use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A single message produced by a tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolMessage {
    Text(String),
    Json(Value),
    Blob {
        filename: String,
        mime_type: String,
        data: Vec<u8>,
    },
}

/// Ordered messages of one tool invocation
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ToolOutput {
    messages: Vec<ToolMessage>,
}

impl ToolOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text + `{"status": "error", "message": ...}`, the shape every tool fails with
    pub fn failure(message: impl Into<String>) -> Self {
        let mut output = Self::new();
        output.error(message);
        output
    }

    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.messages.push(ToolMessage::Text(text.into()));
        self
    }

    pub fn json(&mut self, value: Value) -> &mut Self {
        self.messages.push(ToolMessage::Json(value));
        self
    }

    pub fn blob(
        &mut self,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> &mut Self {
        self.messages.push(ToolMessage::Blob {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
        });
        self
    }

    pub fn error(&mut self, message: impl Into<String>) -> &mut Self {
        let message = message.into();
        self.text(message.clone());
        self.json(json!({
            "status": "error",
            "message": message,
        }))
    }

    /// Like `error`, with the underlying cause under `details`
    pub fn error_with_details(
        &mut self,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> &mut Self {
        let message = message.into();
        self.text(message.clone());
        self.json(json!({
            "status": "error",
            "message": message,
            "details": details.into(),
        }))
    }

    pub fn messages(&self) -> &[ToolMessage] {
        &self.messages
    }

    /// Last JSON message, which carries the invocation's status
    pub fn status_json(&self) -> Option<&Value> {
        self.messages.iter().rev().find_map(|message| match message {
            ToolMessage::Json(value) => Some(value),
            _ => None,
        })
    }

    pub fn is_error(&self) -> bool {
        self.status_json()
            .and_then(|value| value.get("status"))
            .and_then(Value::as_str)
            == Some("error")
    }

    pub fn texts(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|message| match message {
                ToolMessage::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn blobs(&self) -> Vec<(&str, &str, &[u8])> {
        self.messages
            .iter()
            .filter_map(|message| match message {
                ToolMessage::Blob { filename, mime_type, data } => {
                    Some((filename.as_str(), mime_type.as_str(), data.as_slice()))
                }
                _ => None,
            })
            .collect()
    }
}

/// One line of host output
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostLine<'a> {
    Text {
        text: &'a str,
    },
    Json {
        data: &'a Value,
    },
    Blob {
        filename: &'a str,
        mime_type: &'a str,
        size: usize,
        path: PathBuf,
    },
}

/// Delivers tool messages: JSON lines on a writer, blobs as files in `output_dir`
pub struct MessageSink {
    output_dir: PathBuf,
}

impl MessageSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub async fn emit<W: Write>(&self, output: &ToolOutput, out: &mut W) -> Result<()> {
        for message in output.messages() {
            let line = match message {
                ToolMessage::Text(text) => serde_json::to_string(&HostLine::Text { text })?,
                ToolMessage::Json(data) => serde_json::to_string(&HostLine::Json { data })?,
                ToolMessage::Blob { filename, mime_type, data } => {
                    let path = self.write_blob(filename, data).await?;
                    serde_json::to_string(&HostLine::Blob {
                        filename,
                        mime_type,
                        size: data.len(),
                        path,
                    })?
                }
            };
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(())
    }

    async fn write_blob(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        // Only the final component: a blob name must not escape the output directory.
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid blob filename: {}", filename))?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(name);
        tokio::fs::write(&path, data).await?;
        debug!("Wrote {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_failure_shape() {
        let output = ToolOutput::failure("No video file provided");
        assert_eq!(
            output.messages(),
            &[
                ToolMessage::Text("No video file provided".to_string()),
                ToolMessage::Json(json!({"status": "error", "message": "No video file provided"})),
            ]
        );
        assert!(output.is_error());
    }

    #[test]
    fn test_status_comes_from_last_json() {
        let mut output = ToolOutput::new();
        output
            .text("working")
            .json(json!({"status": "success"}))
            .text("done");
        assert!(!output.is_error());
        assert_eq!(output.texts(), vec!["working", "done"]);
    }

    #[test]
    fn test_error_with_details() {
        let mut output = ToolOutput::new();
        output.error_with_details("Failed to upload image", "unexpected status code 500");
        assert!(output.is_error());
        assert_eq!(output.texts(), vec!["Failed to upload image"]);
        assert_eq!(
            output.status_json().unwrap()["details"],
            "unexpected status code 500"
        );
    }

    #[tokio::test]
    async fn test_emit_writes_lines_and_files() {
        let temp_dir = TempDir::new().unwrap();
        let sink = MessageSink::new(temp_dir.path().join("out"));

        let mut output = ToolOutput::new();
        output
            .text("hello")
            .blob("../frame.jpg", "image/jpeg", vec![1, 2, 3])
            .json(json!({"status": "success"}));

        let mut buffer = Vec::new();
        sink.emit(&output, &mut buffer).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], json!({"type": "text", "text": "hello"}));
        assert_eq!(lines[1]["type"], "blob");
        assert_eq!(lines[1]["size"], 3);
        assert_eq!(lines[2], json!({"type": "json", "data": {"status": "success"}}));

        let written = temp_dir.path().join("out").join("frame.jpg");
        assert_eq!(std::fs::read(written).unwrap(), vec![1, 2, 3]);
    }
}
