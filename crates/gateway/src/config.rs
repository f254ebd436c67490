use std::time::Duration;

use crate::api::GatewayError;

pub const DEFAULT_BASE_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_CHAT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "google/gemini-2.5-flash-image-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Gateway endpoint, credentials and model selection.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL up to and including the API version, without trailing `/`.
    pub base_url: String,
    pub api_key: String,
    pub chat_model: String,
    pub image_model: String,
    /// Key used for image calls instead of [`api_key`](Self::api_key).
    pub image_api_key: Option<String>,
    /// Per-request timeout for non-streaming calls.
    pub request_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Default                                 |
    /// |---------------------------|-----------------------------------------|
    /// | `AI_GATEWAY_URL`          | `https://ai.gateway.lovable.dev/v1`     |
    /// | `AI_GATEWAY_KEY`          | required                                |
    /// | `AI_GATEWAY_TIMEOUT_SECS` | `120`                                   |
    /// | `CHAT_MODEL`              | `google/gemini-2.5-flash`               |
    /// | `IMAGE_MODEL`             | `google/gemini-2.5-flash-image-preview` |
    /// | `IMAGE_MODEL_API_KEY`     | unset (falls back to `AI_GATEWAY_KEY`)  |
    pub fn from_env() -> Result<Self, GatewayError> {
        let base_url = std::env::var("AI_GATEWAY_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let api_key = std::env::var("AI_GATEWAY_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| GatewayError::Config("AI_GATEWAY_KEY must be set".into()))?;

        let timeout_secs: u64 = match std::env::var("AI_GATEWAY_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| {
                GatewayError::Config("AI_GATEWAY_TIMEOUT_SECS must be a valid u64".into())
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let mut config = Self::new(base_url, api_key);
        if let Ok(model) = std::env::var("CHAT_MODEL") {
            config.chat_model = model;
        }
        if let Ok(model) = std::env::var("IMAGE_MODEL") {
            config.image_model = model;
        }
        config.image_api_key = std::env::var("IMAGE_MODEL_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        config.request_timeout = Duration::from_secs(timeout_secs);
        Ok(config)
    }

    /// Key for image generation and editing calls.
    pub fn image_key(&self) -> &str {
        self.image_api_key.as_deref().unwrap_or(&self.api_key)
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_key_falls_back_to_gateway_key() {
        let mut config = GatewayConfig::new("https://gw.example.com/v1/", "main");
        assert_eq!(config.image_key(), "main");
        assert_eq!(
            config.completions_url(),
            "https://gw.example.com/v1/chat/completions"
        );

        config.image_api_key = Some("images".into());
        assert_eq!(config.image_key(), "images");
    }
}
