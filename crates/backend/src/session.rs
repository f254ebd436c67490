//! Session lifecycle with retry and token persistence.
//!
//! [`SessionManager`] restores the persisted session on start, refreshing
//! it when expired, and retries transient failures with backoff while
//! publishing progress on a [`ConnectionMonitor`]. A session that can never
//! be recovered (rejected refresh token, or a backend still unavailable
//! after every retry) has its stored tokens cleared.

use std::sync::Arc;

use menuforge_core::connection::ConnectionMonitor;
use menuforge_core::error::{Classify, ErrorKind};
use menuforge_core::retry::{retry_with_backoff, RetryPolicy};
use menuforge_core::session::AUTH_STORAGE_PREFIX;

use crate::auth::{AuthClient, Session, SignUpOutcome};
use crate::error::BackendError;
use crate::store::{auth_token_key, clear_auth_tokens, SessionStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("An account with this email already exists")]
    AlreadyRegistered,
}

impl Classify for SessionError {
    fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Backend(e) => e.kind(),
            SessionError::Store(_) => ErrorKind::Other,
            SessionError::AlreadyRegistered => ErrorKind::AlreadyExists,
        }
    }
}

pub struct SessionManager {
    auth: AuthClient,
    store: Arc<dyn SessionStore>,
    policy: RetryPolicy,
    monitor: ConnectionMonitor,
    storage_key: String,
}

impl SessionManager {
    pub fn new(auth: AuthClient, store: Arc<dyn SessionStore>, policy: RetryPolicy) -> Self {
        let storage_key =
            auth_token_key(AUTH_STORAGE_PREFIX, auth.backend().config().project_ref());
        Self {
            auth,
            store,
            policy,
            monitor: ConnectionMonitor::new(),
            storage_key,
        }
    }

    pub fn monitor(&self) -> &ConnectionMonitor {
        &self.monitor
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// The persisted session, without validating or refreshing it.
    pub fn stored_session(&self) -> Result<Option<Session>, SessionError> {
        let Some(raw) = self.store.get(&self.storage_key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable stored session");
                self.store.remove(&self.storage_key)?;
                Ok(None)
            }
        }
    }

    /// Load the persisted session, refreshing it when expired.
    ///
    /// Returns `Ok(None)` when there is no session or the refresh token was
    /// rejected. Transient failures are retried; once retries run out the
    /// stored tokens are cleared and the error is returned.
    pub async fn restore_session(&self) -> Result<Option<Session>, SessionError> {
        self.monitor.connecting();

        let Some(stored) = self.stored_session()? else {
            self.monitor.connected();
            return Ok(None);
        };
        if !stored.is_expired() {
            self.monitor.connected();
            return Ok(Some(stored));
        }

        let refreshed = retry_with_backoff(
            &self.policy,
            || self.auth.refresh_session(&stored.refresh_token),
            |attempt| self.monitor.reconnecting(attempt.attempt),
        )
        .await;

        match refreshed {
            Ok(session) => {
                self.persist(&session)?;
                self.monitor.connected();
                tracing::info!(user_id = %session.user.id, "Session refreshed");
                Ok(Some(session))
            }
            Err(e) => match e.kind() {
                ErrorKind::InvalidCredentials | ErrorKind::Unauthorized => {
                    tracing::info!(error = %e, "Stored session rejected, signing out");
                    clear_auth_tokens(self.store.as_ref(), AUTH_STORAGE_PREFIX)?;
                    self.monitor.connected();
                    Ok(None)
                }
                ErrorKind::Transient => {
                    tracing::error!(error = %e, "Backend unavailable, clearing stored session");
                    clear_auth_tokens(self.store.as_ref(), AUTH_STORAGE_PREFIX)?;
                    self.monitor.failed();
                    Err(e.into())
                }
                _ => {
                    self.monitor.failed();
                    Err(e.into())
                }
            },
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        self.monitor.connecting();
        let result = retry_with_backoff(
            &self.policy,
            || self.auth.sign_in_with_password(email, password),
            |attempt| self.monitor.reconnecting(attempt.attempt),
        )
        .await;

        let session = self.settle(result)?;
        self.persist(&session)?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Register a new account. A session is persisted only when the
    /// backend returns one (no email confirmation required).
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, SessionError> {
        self.monitor.connecting();
        let result = retry_with_backoff(
            &self.policy,
            || self.auth.sign_up(email, password),
            |attempt| self.monitor.reconnecting(attempt.attempt),
        )
        .await;

        let outcome = match self.settle(result) {
            Err(SessionError::Backend(e)) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SessionError::AlreadyRegistered);
            }
            other => other?,
        };
        if let SignUpOutcome::Session(session) = &outcome {
            self.persist(session)?;
        }
        Ok(outcome)
    }

    /// Revoke the current session and clear every stored token.
    ///
    /// A failed revoke is logged; local tokens are cleared regardless.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        if let Some(session) = self.stored_session()? {
            if let Err(e) = self.auth.sign_out(&session.access_token).await {
                tracing::warn!(error = %e, "Failed to revoke session");
            }
        }
        clear_auth_tokens(self.store.as_ref(), AUTH_STORAGE_PREFIX)?;
        Ok(())
    }

    /// Update the connection status from the final outcome of a retried call.
    fn settle<T>(&self, result: Result<T, BackendError>) -> Result<T, SessionError> {
        match result {
            Ok(value) => {
                self.monitor.connected();
                Ok(value)
            }
            Err(e) if e.kind().is_transient() => {
                self.monitor.failed();
                Err(e.into())
            }
            Err(e) => {
                // The backend answered, so the connection itself is fine.
                self.monitor.connected();
                Err(e.into())
            }
        }
    }

    fn persist(&self, session: &Session) -> Result<(), SessionError> {
        let raw = serde_json::to_string(session).map_err(StoreError::from)?;
        self.store.set(&self.storage_key, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use chrono::Utc;
    use menuforge_core::connection::ConnectionStatus;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::BackendClient;
    use crate::config::BackendConfig;
    use crate::store::MemorySessionStore;

    const USER_ID: &str = "6a1f2c3e-0000-4000-8000-000000000002";

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn session_json(access: &str, expires_at: i64) -> serde_json::Value {
        json!({
            "access_token": access,
            "refresh_token": "refresh-1",
            "expires_at": expires_at,
            "user": { "id": USER_ID }
        })
    }

    fn manager(server: &MockServer, store: Arc<MemorySessionStore>) -> SessionManager {
        let auth = AuthClient::new(BackendClient::new(BackendConfig::new(server.uri(), "anon")));
        SessionManager::new(auth, store, fast_policy())
    }

    fn store_session(manager: &SessionManager, store: &MemorySessionStore, expires_at: i64) {
        store
            .set(
                manager.storage_key(),
                &session_json("old-access", expires_at).to_string(),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn restore_without_session_is_none() {
        let server = MockServer::start().await;
        let manager = manager(&server, Arc::new(MemorySessionStore::new()));

        assert_eq!(manager.restore_session().await.unwrap(), None);
        assert_eq!(manager.monitor().current(), ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn restore_valid_session_skips_network() {
        let server = MockServer::start().await;
        let store = Arc::new(MemorySessionStore::new());
        let manager = manager(&server, Arc::clone(&store));
        store_session(&manager, &store, Utc::now().timestamp() + 3600);

        let session = manager.restore_session().await.unwrap().unwrap();
        assert_eq!(session.access_token, "old-access");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn restore_refreshes_after_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(session_json("new-access", Utc::now().timestamp() + 3600)),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemorySessionStore::new());
        let manager = manager(&server, Arc::clone(&store));
        store_session(&manager, &store, Utc::now().timestamp() - 60);

        let session = manager.restore_session().await.unwrap().unwrap();
        assert_eq!(session.access_token, "new-access");
        assert_eq!(manager.stored_session().unwrap().unwrap().access_token, "new-access");
        assert_eq!(manager.monitor().current(), ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn persistent_unavailability_clears_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .expect(4)
            .mount(&server)
            .await;

        let store = Arc::new(MemorySessionStore::new());
        let manager = manager(&server, Arc::clone(&store));
        store_session(&manager, &store, Utc::now().timestamp() - 60);

        let err = manager.restore_session().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(store.keys().unwrap().is_empty());
        assert_eq!(manager.monitor().current(), ConnectionStatus::Error);
    }

    #[tokio::test]
    async fn rejected_refresh_token_signs_out_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error_code": "refresh_token_not_found",
                "msg": "Invalid Refresh Token: Refresh Token Not Found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemorySessionStore::new());
        let manager = manager(&server, Arc::clone(&store));
        store_session(&manager, &store, Utc::now().timestamp() - 60);

        assert_eq!(manager.restore_session().await.unwrap(), None);
        assert!(store.keys().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_up_maps_existing_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": 422,
                "error_code": "user_already_exists",
                "msg": "User already registered"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(&server, Arc::new(MemorySessionStore::new()));
        let err = manager.sign_up("chef@example.com", "pw").await.unwrap_err();
        assert_matches!(err, SessionError::AlreadyRegistered);
    }

    #[tokio::test]
    async fn sign_in_persists_and_sign_out_clears() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(session_json("fresh", Utc::now().timestamp() + 3600)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemorySessionStore::new());
        let manager = manager(&server, Arc::clone(&store));

        manager.sign_in("chef@example.com", "pw").await.unwrap();
        assert!(manager.stored_session().unwrap().is_some());

        manager.sign_out().await.unwrap();
        assert!(store.keys().unwrap().is_empty());
    }
}
