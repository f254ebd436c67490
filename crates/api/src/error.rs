use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use menuforge_backend::BackendError;
use menuforge_core::error::{Classify, CoreError, ErrorKind};
use menuforge_gateway::GatewayError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce `{"error": message, "code": code}`
/// bodies. Internal failures are logged and replaced by a generic message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `menuforge_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failure talking to the backend.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A failure talking to the AI gateway.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Backend(BackendError::Invalid(core)) => classify_core_error(core),
            AppError::Backend(err) => match err.kind() {
                ErrorKind::Unauthorized | ErrorKind::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "Invalid or expired token".to_string(),
                ),
                ErrorKind::NotFound => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "Resource not found".to_string(),
                ),
                _ => internal(err),
            },

            AppError::Gateway(err) => match err {
                GatewayError::RateLimited => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMITED",
                    "Rate limits exceeded, please try again later.".to_string(),
                ),
                GatewayError::CreditsExhausted => (
                    StatusCode::PAYMENT_REQUIRED,
                    "PAYMENT_REQUIRED",
                    "Payment required, please add funds to your workspace.".to_string(),
                ),
                GatewayError::NoImage => {
                    tracing::warn!("Model returned no image");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "NO_IMAGE",
                        "No image was generated".to_string(),
                    )
                }
                other => {
                    tracing::error!(error = %other, "AI gateway error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "AI_GATEWAY_ERROR",
                        "AI gateway error".to_string(),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => internal(msg),
    }
}

fn internal(err: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_map_to_documented_statuses() {
        let cases = [
            (AppError::Gateway(GatewayError::RateLimited), StatusCode::TOO_MANY_REQUESTS),
            (AppError::Gateway(GatewayError::CreditsExhausted), StatusCode::PAYMENT_REQUIRED),
            (AppError::Gateway(GatewayError::Unauthorized), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Gateway(GatewayError::NoImage), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn backend_auth_failure_is_unauthorized() {
        let err = AppError::Backend(BackendError::from_response(401, r#"{"message":"JWT expired"}"#));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn validation_is_bad_request() {
        let err = AppError::Core(CoreError::Validation("Prompt is required".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
