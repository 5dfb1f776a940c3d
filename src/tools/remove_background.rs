//! # Remove Background Tool
//!
//! Rimuove lo sfondo di un'immagine tramite il task remoto `removebg` di iLoveImg.
//!
//! ## Output:
//! - successo: text, blob `removed_background_<nome>` (`image/png`), JSON di riepilogo
//! - fallimento: text con il messaggio breve dello step fallito, JSON con `details`

use serde_json::json;
use tracing::warn;

use super::ToolFile;
use crate::config::Config;
use crate::error::ToolError;
use crate::iloveimg::{client_from_config, HttpTransport, Pause, RemoteTaskClient};
use crate::message::ToolOutput;
use crate::progress::ProgressManager;
use crate::provider;

#[derive(Debug, Clone, Default)]
pub struct RemoveBackgroundParams {
    pub image: Option<ToolFile>,
}

pub struct RemoveBackgroundTool {
    config: Config,
}

impl RemoveBackgroundTool {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn invoke(&self, params: RemoveBackgroundParams) -> ToolOutput {
        let Some(image) = params.image else {
            return ToolOutput::failure("No image file provided");
        };

        let credential = match provider::validate_credentials(&self.config) {
            Ok(credential) => credential,
            Err(ToolError::Config(message)) => return ToolOutput::failure(message),
            Err(e) => return ToolOutput::failure(e.to_string()),
        };

        let mut client = match client_from_config(&self.config, credential) {
            Ok(client) => client,
            Err(e) => return ToolOutput::failure(format!("Error processing image file: {}", e)),
        };

        self.remove_with(&mut client, &image).await
    }

    /// Run the pipeline on an already built client
    pub async fn remove_with<T: HttpTransport, P: Pause>(
        &self,
        client: &mut RemoteTaskClient<T, P>,
        image: &ToolFile,
    ) -> ToolOutput {
        let spinner = ProgressManager::spinner(
            &format!("Removing background from {}", image.filename),
            self.config.show_progress,
        );
        let result = client
            .process(&image.blob, &image.filename, &image.mime_type)
            .await;
        spinner.finish_and_clear();

        let artifact = match result {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!("Background removal failed for {}: {}", image.filename, e);
                let mut output = ToolOutput::new();
                output.error_with_details(e.summary(), e.to_string());
                return output;
            }
        };

        let mut output = ToolOutput::new();
        output
            .text("Background removal completed successfully")
            .blob(artifact.filename.clone(), artifact.mime_type.clone(), artifact.data)
            .json(json!({
                "status": "success",
                "message": "Background removal completed successfully",
                "original_filename": artifact.original_filename,
                "processed_filename": artifact.filename,
            }));
        output
    }
}
