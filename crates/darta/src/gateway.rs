use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

use crate::models::content::InlineContent;
use crate::providers::configs::GeminiProviderConfig;

/// Narrow interface to the one supported capability: marketing-image
/// synthesis from a text prompt. Best-effort by contract: every failure is
/// reported as `None`, and callers must treat `None` as "no image", not as a
/// failure of the whole turn.
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    async fn synthesize(&self, prompt: &str) -> Option<InlineContent>;
}

/// Image synthesis backed by the Gemini image model.
pub struct GeminiImageSynthesizer {
    client: Client,
    config: Option<GeminiProviderConfig>,
}

impl GeminiImageSynthesizer {
    pub fn new(config: GeminiProviderConfig) -> Self {
        Self {
            client: default_client(),
            config: Some(config),
        }
    }

    /// Build from the environment. A missing credential is not an error here;
    /// the synthesizer simply never produces an image.
    pub fn from_env() -> Self {
        let config = match GeminiProviderConfig::image_from_env() {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(error = %e, "image synthesis disabled");
                None
            }
        };
        Self {
            client: default_client(),
            config,
        }
    }

    async fn request(&self, config: &GeminiProviderConfig, prompt: &str) -> Option<Value> {
        let url = format!(
            "{}/models/{}:generateContent",
            config.host.trim_end_matches('/'),
            config.model
        );

        let payload = json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &config.api_key)
            .json(&payload)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "image synthesis request failed");
            return None;
        }

        response.json().await.ok()
    }
}

fn default_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(600))
        .build()
        .unwrap_or_default()
}

#[async_trait]
impl ImageSynthesizer for GeminiImageSynthesizer {
    async fn synthesize(&self, prompt: &str) -> Option<InlineContent> {
        let config = self.config.as_ref()?;
        let response = self.request(config, prompt).await?;
        let image = extract_inline_image(&response);
        if image.is_none() {
            warn!("image synthesis response carried no inline image");
        }
        image
    }
}

/// First inline-data part of the first candidate, if any.
fn extract_inline_image(response: &Value) -> Option<InlineContent> {
    let parts = response["candidates"][0]["content"]["parts"].as_array()?;
    parts.iter().find_map(|part| {
        let inline = part.get("inlineData")?;
        Some(InlineContent {
            mime_type: inline["mimeType"].as_str()?.to_string(),
            data: inline["data"].as_str()?.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> GeminiProviderConfig {
        GeminiProviderConfig::new(
            server.uri(),
            "test_api_key".to_string(),
            "gemini-2.5-flash-image".to_string(),
        )
    }

    #[tokio::test]
    async fn test_synthesize_returns_inline_image() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-image:generateContent"))
            .and(header("x-goog-api-key", "test_api_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [
                            {"text": "here you go"},
                            {"inlineData": {"mimeType": "image/png", "data": "QUJD"}}
                        ]
                    }
                }]
            })))
            .mount(&mock_server)
            .await;

        let synthesizer = GeminiImageSynthesizer::new(config_for(&mock_server));
        let image = synthesizer.synthesize("a soap flyer").await.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "QUJD");
    }

    #[tokio::test]
    async fn test_synthesize_no_image_part_is_none() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"text": "cannot draw that"}]}
                }]
            })))
            .mount(&mock_server)
            .await;

        let synthesizer = GeminiImageSynthesizer::new(config_for(&mock_server));
        assert!(synthesizer.synthesize("a soap flyer").await.is_none());
    }

    #[tokio::test]
    async fn test_synthesize_http_error_is_none() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let synthesizer = GeminiImageSynthesizer::new(config_for(&mock_server));
        assert!(synthesizer.synthesize("a soap flyer").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_credential_is_none_without_network() {
        let synthesizer = GeminiImageSynthesizer {
            client: default_client(),
            config: None,
        };
        assert!(synthesizer.synthesize("a soap flyer").await.is_none());
    }
}
