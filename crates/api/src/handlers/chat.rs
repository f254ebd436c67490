//! `POST /functions/v1/chat`: streaming assistant for menu marketing.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use menuforge_backend::models::admin_setting::CHAT_SYSTEM_PROMPT;
use menuforge_backend::repositories::AdminSettingsRepo;
use menuforge_core::types::RecordId;
use menuforge_gateway::messages::{ChatMessage, Role};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// System prompt used when no `chat_system_prompt` setting exists.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly assistant for restaurant owners. \
    Help them write menu descriptions, plan food photography and craft prompts \
    for generating appetizing marketing images. Keep answers short and practical.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub organization_id: Option<RecordId>,
}

/// Relay a streamed completion to the caller as `text/event-stream`.
///
/// Client-supplied system messages are dropped; the configured system
/// prompt is always the first message.
pub async fn chat(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<ChatRequest>,
) -> AppResult<Response> {
    if input.messages.iter().all(|m| m.role == Role::System) {
        return Err(AppError::BadRequest("At least one message is required".into()));
    }

    let system_prompt = load_system_prompt(&state, &user).await;

    let mut messages = Vec::with_capacity(input.messages.len() + 1);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(input.messages.into_iter().filter(|m| m.role != Role::System));

    tracing::info!(
        user_id = %user.user_id,
        organization_id = ?input.organization_id,
        messages = messages.len(),
        "Starting chat",
    );

    let stream = state.gateway.chat_stream(&messages, None).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

/// The admin-configured system prompt, or the built-in default.
///
/// A failed lookup is logged and falls back to the default.
async fn load_system_prompt(state: &AppState, user: &AuthUser) -> String {
    let client = state.settings_client(&user.access_token);
    match AdminSettingsRepo::get_text(&client, CHAT_SYSTEM_PROMPT).await {
        Ok(Some(prompt)) => prompt,
        Ok(None) => DEFAULT_SYSTEM_PROMPT.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load chat system prompt, using default");
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
    }
}
