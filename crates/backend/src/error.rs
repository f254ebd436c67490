//! Errors from the backend boundary, classified into [`ErrorKind`].
//!
//! Classification happens once, here, from the HTTP status, the transport
//! error type and the error code in the response body. The message text
//! is only consulted when none of those is available.

use menuforge_core::error::{Classify, CoreError, ErrorKind};
use serde::Deserialize;

/// PostgreSQL unique-violation SQLSTATE, surfaced by the REST API as `code`.
const UNIQUE_VIOLATION: &str = "23505";

/// Auth API error codes meaning the password or refresh token was rejected.
const INVALID_CREDENTIAL_CODES: &[&str] = &[
    "invalid_credentials",
    "invalid_grant",
    "refresh_token_not_found",
    "refresh_token_already_used",
];

/// Auth API error codes meaning the account already exists.
const ALREADY_EXISTS_CODES: &[&str] = &["user_already_exists", "email_exists"];

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {message}")]
    Api {
        status: u16,
        /// Machine-readable code from the body, when present.
        code: Option<String>,
        message: String,
    },

    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Input rejected before any request was sent.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// Missing or invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BackendError {
    /// Build an [`BackendError::Api`] from a status and raw body text.
    ///
    /// Understands both the REST API body (`{code, message}`) and the two
    /// auth API shapes (`{error, error_description}` and
    /// `{error_code, msg}`).
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

        let code = parsed
            .error_code
            .or(parsed.code.and_then(|c| match c {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            }))
            .or(parsed.error);

        let message = parsed
            .message
            .or(parsed.msg)
            .or(parsed.error_description)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.trim().to_string()
                }
            });

        BackendError::Api {
            status,
            code,
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            BackendError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl Classify for BackendError {
    fn kind(&self) -> ErrorKind {
        match self {
            BackendError::Request(e) => {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    ErrorKind::Transient
                } else if let Some(status) = e.status() {
                    classify_status(status.as_u16(), None)
                } else {
                    ErrorKind::from_message(&e.to_string())
                }
            }
            BackendError::Api {
                status,
                code,
                message,
            } => match classify_status(*status, code.as_deref()) {
                ErrorKind::Other => ErrorKind::from_message(message),
                kind => kind,
            },
            BackendError::Decode(_) | BackendError::Invalid(_) | BackendError::Config(_) => {
                ErrorKind::Other
            }
        }
    }
}

fn classify_status(status: u16, code: Option<&str>) -> ErrorKind {
    if let Some(code) = code {
        if INVALID_CREDENTIAL_CODES.contains(&code) {
            return ErrorKind::InvalidCredentials;
        }
        if ALREADY_EXISTS_CODES.contains(&code) || code == UNIQUE_VIOLATION {
            return ErrorKind::AlreadyExists;
        }
    }

    match status {
        408 | 429 | 500..=599 => ErrorKind::Transient,
        401 | 403 => ErrorKind::Unauthorized,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::AlreadyExists,
        _ => ErrorKind::Other,
    }
}

/// Union of the error body shapes returned by the backend's services.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    /// REST API SQLSTATE, or numeric HTTP status in newer auth responses.
    code: Option<serde_json::Value>,
    message: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    error_code: Option<String>,
    msg: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_unavailable_is_transient() {
        let err = BackendError::from_response(503, "Service Unavailable");
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[test]
    fn rate_limit_is_transient() {
        let err = BackendError::from_response(429, "");
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[test]
    fn invalid_grant_is_invalid_credentials() {
        let err = BackendError::from_response(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(err.kind(), ErrorKind::InvalidCredentials);
        assert!(err.to_string().contains("Invalid login credentials"));
    }

    #[test]
    fn newer_auth_body_is_understood() {
        let err = BackendError::from_response(
            422,
            r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#,
        );
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(err.to_string().contains("User already registered"));
    }

    #[test]
    fn unique_violation_is_already_exists() {
        let err = BackendError::from_response(
            409,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#,
        );
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn expired_jwt_is_unauthorized() {
        let err = BackendError::from_response(401, r#"{"code":"PGRST301","message":"JWT expired"}"#);
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn untyped_gateway_message_falls_back_to_markers() {
        let err = BackendError::from_response(400, "upstream connect error or disconnect");
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[test]
    fn plain_bad_request_is_other() {
        let err = BackendError::from_response(400, r#"{"message":"bad filter"}"#);
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
