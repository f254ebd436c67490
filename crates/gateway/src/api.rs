//! HTTP client for the gateway's chat completions endpoint.
//!
//! Chat requests are streamed back as raw SSE bytes so callers can either
//! relay them unchanged or parse them with [`SseBuffer`](crate::sse::SseBuffer).
//! Image generation and editing use the same endpoint with image output
//! enabled and return the first generated image URL.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use menuforge_core::error::{Classify, ErrorKind};

use crate::config::GatewayConfig;
use crate::messages::{ChatCompletion, ChatCompletionRequest, ChatMessage, IMAGE_MODALITIES};

/// Raw body of a streaming completion.
pub type ByteStream = BoxStream<'static, Result<Bytes, GatewayError>>;

/// Errors from the gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("AI gateway rejected the API key")]
    Unauthorized,

    #[error("AI credits exhausted, please add funds to your workspace")]
    CreditsExhausted,

    #[error("Rate limit exceeded, please try again later")]
    RateLimited,

    /// Any other non-2xx status.
    #[error("AI gateway error ({status}): {body}")]
    Upstream {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The model answered without producing an image.
    #[error("No image was generated")]
    NoImage,

    #[error("Unexpected gateway response: {0}")]
    Decode(String),

    #[error("Gateway configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => GatewayError::Unauthorized,
            402 => GatewayError::CreditsExhausted,
            429 => GatewayError::RateLimited,
            _ => GatewayError::Upstream { status, body },
        }
    }
}

impl Classify for GatewayError {
    fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Request(e) if e.is_timeout() || e.is_connect() => ErrorKind::Transient,
            GatewayError::Request(e) => ErrorKind::from_message(&e.to_string()),
            GatewayError::RateLimited => ErrorKind::Transient,
            GatewayError::Upstream { status, .. } if *status >= 500 => ErrorKind::Transient,
            GatewayError::Unauthorized => ErrorKind::Unauthorized,
            _ => ErrorKind::Other,
        }
    }
}

/// Result of an image generation or edit call.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    /// `data:` URL or hosted `https://` URL.
    pub url: String,
    /// Text the model returned alongside the image, if any.
    pub text: Option<String>,
}

/// HTTP client for one gateway.
#[derive(Debug, Clone)]
pub struct GatewayApi {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Start a streaming completion and return its SSE body.
    ///
    /// Uses the configured chat model when `model` is `None`. No timeout is
    /// applied to the body: the stream ends when the gateway closes it or
    /// the caller drops it.
    pub async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>,
    ) -> Result<ByteStream, GatewayError> {
        let model = model.unwrap_or(self.config.chat_model.as_str());
        tracing::debug!(model, messages = messages.len(), "Starting chat stream");

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&ChatCompletionRequest {
                model,
                messages,
                stream: true,
                modalities: None,
            })
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(GatewayError::from))
            .boxed())
    }

    /// Generate an image from `prompt`, optionally conditioned on input
    /// images (image-to-image and edits).
    pub async fn generate_image(
        &self,
        prompt: &str,
        input_images: &[String],
    ) -> Result<ImageResult, GatewayError> {
        let message = if input_images.is_empty() {
            ChatMessage::user(prompt)
        } else {
            ChatMessage::user_with_images(prompt, input_images.iter().cloned())
        };
        let messages = [message];
        let model = self.config.image_model.as_str();
        tracing::info!(
            model,
            prompt_len = prompt.len(),
            inputs = input_images.len(),
            "Requesting image generation",
        );

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(self.config.image_key())
            .timeout(self.config.request_timeout)
            .json(&ChatCompletionRequest {
                model,
                messages: &messages,
                stream: false,
                modalities: Some(IMAGE_MODALITIES),
            })
            .send()
            .await?;

        let completion: ChatCompletion = Self::parse_response(response).await?;
        let Some(choice) = completion.choices.into_iter().next() else {
            return Err(GatewayError::NoImage);
        };
        let url = choice
            .message
            .images
            .into_iter()
            .next()
            .map(|image| image.image_url.url)
            .ok_or(GatewayError::NoImage)?;

        Ok(ImageResult {
            url,
            text: choice.message.content.filter(|t| !t.is_empty()),
        })
    }

    // ---- private helpers ----

    /// Return the response unchanged on success, or a status-specific
    /// [`GatewayError`] on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        tracing::warn!(status = status.as_u16(), body = %body, "AI gateway request failed");
        Err(GatewayError::from_status(status.as_u16(), body))
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}
