use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Closed set of failure categories produced at the boundary that talks to
/// a remote service.
///
/// Retry and session-recovery decisions are made on this value only; no
/// caller downstream of the boundary inspects error message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service was unreachable or overloaded; the same call may succeed later.
    Transient,
    /// The credentials (password or refresh token) were rejected.
    InvalidCredentials,
    /// The record or account being created already exists.
    AlreadyExists,
    /// The access token is missing, expired, or lacks permission.
    Unauthorized,
    /// The addressed resource does not exist.
    NotFound,
    /// Anything else. Never retried.
    Other,
}

/// Lower-cased fragments that mark an untyped error message as transient.
///
/// Only consulted by [`ErrorKind::from_message`], which boundaries use as a
/// last resort when a failure carries no status code or error code.
pub const TRANSIENT_MESSAGE_MARKERS: &[&str] = &[
    "503",
    "service unavailable",
    "network",
    "fetch",
    "connection",
    "upstream",
    "timeout",
];

impl ErrorKind {
    /// Whether an operation failing with this kind should be retried.
    pub fn is_transient(self) -> bool {
        self == ErrorKind::Transient
    }

    /// Classify an opaque error message.
    ///
    /// Returns [`ErrorKind::Transient`] when the message contains one of
    /// [`TRANSIENT_MESSAGE_MARKERS`] (case-insensitive), otherwise
    /// [`ErrorKind::Other`].
    pub fn from_message(message: &str) -> Self {
        let lowered = message.to_lowercase();
        if TRANSIENT_MESSAGE_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
        {
            ErrorKind::Transient
        } else {
            ErrorKind::Other
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Transient => "transient",
            ErrorKind::InvalidCredentials => "invalid_credentials",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// Implemented by error types that can report their [`ErrorKind`].
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}
