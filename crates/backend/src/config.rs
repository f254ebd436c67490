use crate::error::BackendError;

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://abcd1234.supabase.co`.
    pub url: String,
    /// Public (anon) API key sent with every request.
    pub anon_key: String,
    /// Privileged key for server-side storage writes and settings reads.
    pub service_key: Option<String>,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            service_key: None,
        }
    }

    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var               | Required |
    /// |-----------------------|----------|
    /// | `BACKEND_URL`         | yes      |
    /// | `BACKEND_ANON_KEY`    | yes      |
    /// | `BACKEND_SERVICE_KEY` | no       |
    pub fn from_env() -> Result<Self, BackendError> {
        let url = required_env("BACKEND_URL")?;
        let anon_key = required_env("BACKEND_ANON_KEY")?;
        let service_key = std::env::var("BACKEND_SERVICE_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        let mut config = Self::new(url, anon_key);
        config.service_key = service_key;
        Ok(config)
    }

    /// Project reference: the first host label of [`url`](Self::url).
    ///
    /// Used to namespace persisted auth tokens, matching the key format
    /// `sb-{project_ref}-auth-token`.
    pub fn project_ref(&self) -> &str {
        let without_scheme = self
            .url
            .split_once("://")
            .map_or(self.url.as_str(), |(_, rest)| rest);
        without_scheme
            .split(['.', ':', '/'])
            .next()
            .unwrap_or(without_scheme)
    }
}

fn required_env(name: &str) -> Result<String, BackendError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BackendError::Config(format!("{name} must be set")))
}
