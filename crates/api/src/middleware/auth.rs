//! Bearer-token authentication extractor for Axum handlers.
//!
//! Tokens are issued by the backend's auth API; they are verified by asking
//! that API for the owning user rather than by checking signatures locally.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use menuforge_backend::BackendClient;
use menuforge_core::error::{Classify, CoreError, ErrorKind};
use menuforge_core::types::RecordId;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller extracted from the `Authorization: Bearer` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: RecordId,
    pub email: Option<String>,
    /// The raw token, for calling the backend on the user's behalf.
    pub access_token: String,
}

impl AuthUser {
    /// Backend client acting as this user.
    pub fn client(&self, state: &AppState) -> BackendClient {
        state.backend.with_access_token(&self.access_token)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Invalid Authorization format. Expected: Bearer <token>".into(),
                ))
            })?;

        let user = state.auth.get_user(token).await.map_err(|e| match e.kind() {
            ErrorKind::Unauthorized | ErrorKind::InvalidCredentials | ErrorKind::NotFound => {
                AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
            }
            _ => AppError::Backend(e),
        })?;

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            access_token: token.to_string(),
        })
    }
}
