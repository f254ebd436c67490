//! Client for the backend's auth API (password sign-in, sign-up, token
//! refresh, user lookup, sign-out).

use chrono::Utc;
use menuforge_core::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::BackendClient;
use crate::error::BackendError;

/// Seconds before expiry at which a session is treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 10;

/// An authenticated user as returned by the auth API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// A token pair plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    /// Whether the access token is expired, or about to be.
    ///
    /// Sessions without an expiry are treated as valid.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|at| at - EXPIRY_MARGIN_SECS <= Utc::now().timestamp())
    }
}

/// Result of a sign-up: a live session, or a user awaiting email
/// confirmation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    Session(Session),
    ConfirmationRequired(User),
}

/// Thin wrapper over the auth endpoints of one project.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: BackendClient,
}

impl AuthClient {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub fn backend(&self) -> &BackendClient {
        &self.client
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        tracing::debug!(email, "Signing in");
        self.token("password", &json!({ "email": email, "password": password }))
            .await
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, BackendError> {
        tracing::debug!("Refreshing session");
        self.token("refresh_token", &json!({ "refresh_token": refresh_token }))
            .await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, BackendError> {
        tracing::debug!(email, "Signing up");
        let request = self
            .client
            .http()
            .post(self.client.endpoint("auth", "signup"))
            .json(&json!({ "email": email, "password": password }));
        let response = self.client.authorize(request).send().await?;
        BackendClient::parse_response(response).await
    }

    /// Resolve the user owning `access_token`.
    pub async fn get_user(&self, access_token: &str) -> Result<User, BackendError> {
        let request = self.client.http().get(self.client.endpoint("auth", "user"));
        let response = self
            .client
            .with_access_token(access_token)
            .authorize(request)
            .send()
            .await?;
        BackendClient::parse_response(response).await
    }

    /// Revoke the refresh tokens of the session owning `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let request = self
            .client
            .http()
            .post(self.client.endpoint("auth", "logout"));
        let response = self
            .client
            .with_access_token(access_token)
            .authorize(request)
            .send()
            .await?;
        BackendClient::ensure_success(response).await?;
        Ok(())
    }

    async fn token(
        &self,
        grant_type: &str,
        body: &serde_json::Value,
    ) -> Result<Session, BackendError> {
        let request = self
            .client
            .http()
            .post(self.client.endpoint("auth", "token"))
            .query(&[("grant_type", grant_type)])
            .json(body);
        let response = self.client.authorize(request).send().await?;
        BackendClient::parse_response(response).await
    }
}
