//! # Base64 Image Tool
//!
//! Converte una stringa base64 (o una data URL `data:image/<fmt>;base64,...`)
//! in un blob immagine.
//!
//! ## Regole:
//! - data URL: il formato determina MIME ed estensione; formati sconosciuti → PNG
//! - stringa semplice: decodificata per intero, trattata come PNG
//! - i caratteri fuori dall'alfabeto base64 (spazi, a capo) vengono ignorati

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::json;
use tracing::debug;

use crate::message::ToolOutput;

const DATA_URL_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = "base64,";

/// Padding is required, non-zero trailing bits are tolerated
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Clone, Default)]
pub struct Base64ImageParams {
    pub base64_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub data: Vec<u8>,
    pub mime_type: &'static str,
    pub extension: String,
}

impl DecodedImage {
    pub fn output_filename(&self) -> String {
        format!("converted_image.{}", self.extension)
    }
}

/// MIME type for a data URL image format, if it is one we know
pub fn mime_for_format(format: &str) -> Option<&'static str> {
    match format {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Split `data:image/<fmt>;base64,<data>` into the lowercased format and payload
fn split_data_url(input: &str) -> Option<(String, &str)> {
    let rest = input.strip_prefix(DATA_URL_PREFIX)?;
    let (format, rest) = rest.split_once(';')?;
    let payload = rest.strip_prefix(BASE64_MARKER)?;
    if format.is_empty() || payload.is_empty() {
        return None;
    }
    Some((format.to_lowercase(), payload))
}

fn decode_lenient(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = payload
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();
    LENIENT_STANDARD.decode(cleaned)
}

pub fn decode_image(input: &str) -> Result<DecodedImage, String> {
    let (data, mime_type, extension) = match split_data_url(input) {
        Some((format, payload)) => {
            let data = decode_lenient(payload)
                .map_err(|e| format!("Failed to decode base64 data: {}", e))?;
            match mime_for_format(&format) {
                Some(mime_type) => (data, mime_type, format),
                None => (data, "image/png", "png".to_string()),
            }
        }
        None => {
            let data = decode_lenient(input)
                .map_err(|e| format!("Invalid base64 string format: {}", e))?;
            (data, "image/png", "png".to_string())
        }
    };

    if data.is_empty() {
        return Err("Decoded image data is empty".to_string());
    }

    Ok(DecodedImage {
        data,
        mime_type,
        extension,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Base64ImageTool;

impl Base64ImageTool {
    pub fn new() -> Self {
        Self
    }

    pub fn invoke(&self, params: Base64ImageParams) -> ToolOutput {
        let input = match params.base64_image.as_deref() {
            Some(input) if !input.is_empty() => input,
            _ => return ToolOutput::failure("No base64 image string provided"),
        };

        let image = match decode_image(input) {
            Ok(image) => image,
            Err(message) => return ToolOutput::failure(message),
        };

        let output_filename = image.output_filename();
        let image_size = image.data.len();
        debug!("Decoded {} bytes as {}", image_size, image.mime_type);

        let mut output = ToolOutput::new();
        output
            .blob(output_filename.clone(), image.mime_type, image.data)
            .json(json!({
                "status": "success",
                "message": "Successfully converted base64 string to image",
                "output_filename": output_filename,
                "mime_type": image.mime_type,
                "image_size": image_size,
            }))
            .text(format!(
                "Successfully converted base64 string to {} ({} bytes)",
                output_filename, image_size
            ));
        output
    }
}
