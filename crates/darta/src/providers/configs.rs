use std::env;

use crate::errors::{DartaError, DartaResult};

pub const DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Connection settings for the Gemini generateContent endpoint.
#[derive(Debug, Clone)]
pub struct GeminiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
}

impl GeminiProviderConfig {
    pub fn new(host: String, api_key: String, model: String) -> Self {
        Self {
            host,
            api_key,
            model,
            temperature: None,
        }
    }

    /// Chat-model config from the environment. The missing-credential error is
    /// the recognized degraded-mode condition; callers are expected to keep
    /// the UI usable when they see it.
    pub fn from_env() -> DartaResult<Self> {
        let _ = dotenv::dotenv();
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| DartaError::Configuration("GEMINI_API_KEY is not set".to_string()))?;
        let host = env::var("GEMINI_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        Ok(Self {
            host,
            api_key,
            model,
            temperature: Some(0.7),
        })
    }

    /// Image-model config from the environment, sharing the same credential.
    pub fn image_from_env() -> DartaResult<Self> {
        let mut config = Self::from_env()?;
        config.model =
            env::var("GEMINI_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string());
        config.temperature = None;
        Ok(config)
    }
}
