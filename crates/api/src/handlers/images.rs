//! Image edge functions: text-to-image, menu photo enhancement and edits.
//!
//! All three call the gateway's image model and share the same response
//! shape. With `persist: true`, an inline `data:` result is uploaded to
//! storage and its public URL returned instead. A requested
//! `organization_id` must be the caller's own unless the caller is an admin.

use axum::extract::State;
use axum::Json;
use menuforge_backend::models::admin_setting::IMAGE_PROMPT_PREFIX;
use menuforge_backend::repositories::{AdminSettingsRepo, ProfileRepo, StyleRepo};
use menuforge_core::error::CoreError;
use menuforge_core::media::{is_data_url, parse_data_url, ImageKind};
use menuforge_core::prompt::{
    compose_image_prompt, compose_menu_prompt, validate_prompt, DEFAULT_RATIO, DEFAULT_RESOLUTION,
};
use menuforge_core::session::UserRole;
use menuforge_core::types::RecordId;
use menuforge_gateway::api::ImageResult;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Storage folder for images without an organization.
const UNASSIGNED_FOLDER: &str = "unassigned";

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
    pub ratio: Option<String>,
    pub resolution: Option<String>,
    pub style_id: Option<RecordId>,
    pub organization_id: Option<RecordId>,
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateMenuImageRequest {
    pub menu_photo_url: String,
    pub prompt: Option<String>,
    pub ratio: Option<String>,
    pub resolution: Option<String>,
    pub style_id: Option<RecordId>,
    pub organization_id: Option<RecordId>,
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Deserialize)]
pub struct EditImageRequest {
    pub image_url: String,
    pub instruction: String,
    pub organization_id: Option<RecordId>,
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub image_url: String,
    pub persisted: bool,
    /// Commentary the model returned with the image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// POST /functions/v1/generate-image
pub async fn generate_image(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<GenerateImageRequest>,
) -> AppResult<Json<ImageResponse>> {
    let organization_id = target_organization(&state, &user, input.organization_id).await?;
    let modifier = style_modifier(&state, &user, input.style_id).await?;
    let composed = compose_image_prompt(
        &input.prompt,
        modifier.as_deref(),
        input.ratio.as_deref().unwrap_or(DEFAULT_RATIO),
        input.resolution.as_deref().unwrap_or(DEFAULT_RESOLUTION),
    )?;
    let composed = with_prompt_prefix(&state, &user, composed).await;

    let result = state.gateway.generate_image(&composed, &[]).await?;
    tracing::info!(user_id = %user.user_id, style_id = ?input.style_id, "Generated image");

    finish(&state, organization_id, input.persist, result).await
}

/// POST /functions/v1/generate-menu-image
pub async fn generate_menu_image(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<GenerateMenuImageRequest>,
) -> AppResult<Json<ImageResponse>> {
    validate_image_url(&input.menu_photo_url, "menu_photo_url")?;
    let organization_id = target_organization(&state, &user, input.organization_id).await?;

    let modifier = style_modifier(&state, &user, input.style_id).await?;
    let composed = compose_image_prompt(
        &compose_menu_prompt(input.prompt.as_deref()),
        modifier.as_deref(),
        input.ratio.as_deref().unwrap_or(DEFAULT_RATIO),
        input.resolution.as_deref().unwrap_or(DEFAULT_RESOLUTION),
    )?;
    let composed = with_prompt_prefix(&state, &user, composed).await;

    let result = state
        .gateway
        .generate_image(&composed, std::slice::from_ref(&input.menu_photo_url))
        .await?;
    tracing::info!(user_id = %user.user_id, "Enhanced menu photo");

    finish(&state, organization_id, input.persist, result).await
}

/// POST /functions/v1/edit-image
pub async fn edit_image(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<EditImageRequest>,
) -> AppResult<Json<ImageResponse>> {
    validate_image_url(&input.image_url, "image_url")?;
    validate_prompt(&input.instruction)?;
    let organization_id = target_organization(&state, &user, input.organization_id).await?;

    let instruction = format!("Edit this image: {}", input.instruction.trim());
    let instruction = with_prompt_prefix(&state, &user, instruction).await;
    let result = state
        .gateway
        .generate_image(&instruction, std::slice::from_ref(&input.image_url))
        .await?;
    tracing::info!(user_id = %user.user_id, "Edited image");

    finish(&state, organization_id, input.persist, result).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_image_url(url: &str, field: &str) -> AppResult<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if !(is_data_url(url) || url.starts_with("https://") || url.starts_with("http://")) {
        return Err(AppError::BadRequest(format!(
            "{field} must be an http(s) or data URL"
        )));
    }
    Ok(())
}

/// Organization a result may be stored under.
///
/// A requested id is checked against the caller's profile: it must match
/// the profile's organization unless the caller is an admin.
async fn target_organization(
    state: &AppState,
    user: &AuthUser,
    requested: Option<RecordId>,
) -> AppResult<Option<RecordId>> {
    let Some(requested) = requested else {
        return Ok(None);
    };
    let profile = ProfileRepo::find_by_id(&user.client(state), user.user_id).await?;
    match profile {
        Some(p) if p.role == UserRole::Admin || p.organization_id == Some(requested) => {
            Ok(Some(requested))
        }
        _ => {
            tracing::warn!(
                user_id = %user.user_id,
                organization_id = %requested,
                "Rejected request for another organization",
            );
            Err(CoreError::Forbidden("Not a member of this organization".into()).into())
        }
    }
}

/// Prompt modifier of the requested style, read as the caller so row-level
/// visibility applies.
async fn style_modifier(
    state: &AppState,
    user: &AuthUser,
    style_id: Option<RecordId>,
) -> AppResult<Option<String>> {
    let Some(style_id) = style_id else {
        return Ok(None);
    };
    let style = StyleRepo::find_by_id(&user.client(state), style_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Unknown style {style_id}")))?;
    Ok(Some(style.prompt_modifier))
}

/// Prepend the admin-configured prefix, if any, to an image instruction.
/// Used by every image function. Lookup failures are logged and ignored.
async fn with_prompt_prefix(state: &AppState, user: &AuthUser, prompt: String) -> String {
    let client = state.settings_client(&user.access_token);
    match AdminSettingsRepo::get_text(&client, IMAGE_PROMPT_PREFIX).await {
        Ok(Some(prefix)) => format!("{} {prompt}", prefix.trim()),
        Ok(None) => prompt,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load image prompt prefix");
            prompt
        }
    }
}

async fn finish(
    state: &AppState,
    organization_id: Option<RecordId>,
    persist: bool,
    result: ImageResult,
) -> AppResult<Json<ImageResponse>> {
    let (image_url, persisted) = if persist {
        persist_image(state, organization_id, result.url).await
    } else {
        (result.url, false)
    };
    Ok(Json(ImageResponse {
        image_url,
        persisted,
        text: result.text,
    }))
}

/// Upload an inline result and return its public URL.
///
/// Hosted URLs are returned unchanged. Without storage, or when decoding or
/// uploading fails, the original URL is returned with `persisted = false`.
async fn persist_image(
    state: &AppState,
    organization_id: Option<RecordId>,
    url: String,
) -> (String, bool) {
    let Some(storage) = &state.storage else {
        tracing::warn!("Persistence requested but storage is not configured");
        return (url, false);
    };
    if !is_data_url(&url) {
        return (url, false);
    }

    let data = match parse_data_url(&url) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(error = %e, "Generated image is not a decodable data URL");
            return (url, false);
        }
    };
    let kind = ImageKind::sniff_or_png(&data.bytes);
    let folder = organization_id.map_or_else(|| UNASSIGNED_FOLDER.to_string(), |id| id.to_string());
    let path = format!("generations/{folder}/{}.{}", uuid::Uuid::new_v4(), kind.extension());
    let bucket = &state.config.storage_bucket;

    match storage
        .upload(bucket, &path, data.bytes, kind.mime_type())
        .await
    {
        Ok(_) => {
            tracing::info!(bucket = %bucket, path = %path, "Persisted generated image");
            (storage.public_url(bucket, &path), true)
        }
        Err(e) => {
            tracing::error!(error = %e, path = %path, "Failed to persist generated image");
            (url, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_validation() {
        assert!(validate_image_url("https://cdn.example.com/a.jpg", "image_url").is_ok());
        assert!(validate_image_url("data:image/png;base64,AAAA", "image_url").is_ok());
        assert!(validate_image_url("  ", "image_url").is_err());
        assert!(validate_image_url("ftp://x", "image_url").is_err());
    }
}
