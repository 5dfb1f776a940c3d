//! # Provider Module
//!
//! Verifica delle credenziali richieste dai tool remoti. Oggi l'unica
//! credenziale è la chiave pubblica iLoveImg (`LOVE_PUBLIC_KEY`).

use crate::config::{Config, PUBLIC_KEY_ENV};
use crate::error::ToolError;

/// The configured iLoveImg public key, or a configuration error
pub fn validate_credentials(config: &Config) -> Result<&str, ToolError> {
    config.public_key().ok_or_else(|| {
        ToolError::Config(format!(
            "{} environment variable is not configured",
            PUBLIC_KEY_ENV
        ))
    })
}
