use menuforge_backend::{BackendConfig, BackendError};
use menuforge_gateway::{GatewayConfig, GatewayError};

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Server configuration loaded from environment variables.
///
/// Server fields have defaults suitable for local development; the backend
/// and gateway sections carry their own required keys.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`).
    pub request_timeout_secs: u64,
    /// Bucket for persisted generated images (default: `generated-images`).
    pub storage_bucket: String,
    /// Emit logs as JSON lines when `LOG_FORMAT=json`.
    pub json_logs: bool,
    pub backend: BackendConfig,
    pub gateway: GatewayConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `120`                      |
    /// | `STORAGE_BUCKET`       | `generated-images`         |
    /// | `LOG_FORMAT`           | `text`                     |
    ///
    /// See [`BackendConfig::from_env`] and [`GatewayConfig::from_env`] for
    /// the remaining variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_env("PORT", "3000", "u16")?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_env("REQUEST_TIMEOUT_SECS", "120", "u64")?;

        let storage_bucket =
            std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "generated-images".into());

        let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage_bucket,
            json_logs,
            backend: BackendConfig::from_env()?,
            gateway: GatewayConfig::from_env()?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(
    name: &'static str,
    default: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let value = std::env::var(name).unwrap_or_else(|_| default.into());
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_uses_default_and_rejects_garbage() {
        let port: u16 = parse_env("MENUFORGE_TEST_UNSET_PORT", "3000", "u16").unwrap();
        assert_eq!(port, 3000);

        let err = parse_env::<u16>("MENUFORGE_TEST_UNSET_PORT", "not-a-port", "u16").unwrap_err();
        assert!(err.to_string().contains("MENUFORGE_TEST_UNSET_PORT"));
    }
}
