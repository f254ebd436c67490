//! REST client for the backend's table API.
//!
//! [`BackendClient`] holds the base URL, API key, and the bearer token to
//! act with. [`BackendClient::from`] starts a [`Query`] against one table;
//! filters are expressed as `column=operator.value` query parameters.

use std::fmt::Display;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::BackendConfig;
use crate::error::BackendError;

/// HTTP client bound to one backend project and one identity.
///
/// Cloning is cheap: the underlying [`reqwest::Client`] pools connections
/// and the configuration is shared.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: Arc<BackendConfig>,
    api_key: String,
    /// Token sent as `Authorization: Bearer`; the API key when anonymous.
    bearer: String,
}

impl BackendClient {
    /// Create an anonymous client using the public API key.
    pub fn new(config: BackendConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(http: reqwest::Client, config: BackendConfig) -> Self {
        let api_key = config.anon_key.clone();
        Self {
            http,
            bearer: api_key.clone(),
            api_key,
            config: Arc::new(config),
        }
    }

    /// A copy of this client acting as the user owning `access_token`.
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
        Self {
            bearer: access_token.into(),
            ..self.clone()
        }
    }

    /// A copy of this client using the privileged service key.
    pub fn service_role(&self) -> Result<Self, BackendError> {
        let key = self
            .config
            .service_key
            .clone()
            .ok_or_else(|| BackendError::Config("BACKEND_SERVICE_KEY is not set".into()))?;
        Ok(Self {
            api_key: key.clone(),
            bearer: key,
            ..self.clone()
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn endpoint(&self, service: &str, path: &str) -> String {
        format!("{}/{service}/v1/{path}", self.config.url)
    }

    /// Attach the API key and bearer token headers.
    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    /// Start a query against `table`.
    pub fn from(&self, table: &str) -> Query<'_> {
        Query {
            client: self,
            table: table.to_string(),
            params: Vec::new(),
        }
    }

    // ---- response helpers ----

    /// Return the response unchanged on success, or a classified
    /// [`BackendError::Api`] built from the status and body.
    pub(crate) async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(BackendError::from_response(status.as_u16(), &body))
    }

    /// Parse a successful JSON response body into the expected type.
    pub(crate) async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// A request being built against one table.
///
/// Filters accumulate as query parameters; a terminal method (`fetch`,
/// `insert`, `update`, `upsert`, `delete`) sends it.
#[derive(Debug)]
pub struct Query<'a> {
    client: &'a BackendClient,
    table: String,
    params: Vec<(String, String)>,
}

impl Query<'_> {
    /// Restrict the returned columns (`*` when never called).
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".into(), columns.to_string()));
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, format!("eq.{value}"))
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, format!("gte.{value}"))
    }

    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, format!("lte.{value}"))
    }

    /// Match any of `values`. Each value is quoted so commas and
    /// parentheses inside values are not parsed as list syntax.
    pub fn in_<I>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let list = values
            .into_iter()
            .map(|v| format!("\"{}\"", v.to_string().replace('"', "\\\"")))
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, format!("in.({list})"))
    }

    /// Match rows satisfying any of the comma-separated `conditions`,
    /// e.g. `organization_id.is.null,organization_id.eq.{id}`.
    pub fn or(mut self, conditions: &str) -> Self {
        self.params.push(("or".into(), format!("({conditions})")));
        self
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is.null".to_string())
    }

    pub fn not_null(self, column: &str) -> Self {
        self.filter(column, "not.is.null".to_string())
    }

    /// Sort by `column`. Repeated calls add tie-breakers in call order.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        let term = format!("{column}.{direction}");
        match self.params.iter_mut().find(|(k, _)| k == "order") {
            Some((_, existing)) => {
                existing.push(',');
                existing.push_str(&term);
            }
            None => self.params.push(("order".into(), term)),
        }
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".into(), limit.to_string()));
        self
    }

    fn filter(mut self, column: &str, expression: String) -> Self {
        self.params.push((column.to_string(), expression));
        self
    }

    fn has_filters(&self) -> bool {
        self.params
            .iter()
            .any(|(k, _)| !matches!(k.as_str(), "select" | "order" | "limit" | "on_conflict"))
    }

    fn url(&self) -> String {
        self.client.endpoint("rest", &self.table)
    }

    /// Send a `GET` and deserialize every returned row.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, BackendError> {
        tracing::debug!(table = %self.table, params = ?self.params, "Backend select");
        let request = self.client.http().get(self.url()).query(&self.params);
        let response = self.client.authorize(request).send().await?;
        BackendClient::parse_response(response).await
    }

    /// Fetch at most one row.
    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>, BackendError> {
        let rows = self.limit(1).fetch::<T>().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row or an array of rows, returning what was stored.
    pub async fn insert<B, T>(self, body: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(table = %self.table, "Backend insert");
        let request = self
            .client
            .http()
            .post(self.url())
            .query(&self.params)
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.client.authorize(request).send().await?;
        BackendClient::parse_response(response).await
    }

    /// Insert a single row and return it.
    pub async fn insert_one<B, T>(self, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let table = self.table.clone();
        self.insert::<B, T>(body)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode(format!("Insert into {table} returned no rows")))
    }

    /// Insert or merge on `on_conflict` columns.
    pub async fn upsert<B, T>(mut self, body: &B, on_conflict: &str) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(table = %self.table, on_conflict, "Backend upsert");
        self.params
            .push(("on_conflict".into(), on_conflict.to_string()));
        let request = self
            .client
            .http()
            .post(self.url())
            .query(&self.params)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(body);
        let response = self.client.authorize(request).send().await?;
        BackendClient::parse_response(response).await
    }

    /// Patch every row matching the filters, returning the updated rows.
    pub async fn update<B, T>(self, body: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if !self.has_filters() {
            return Err(BackendError::Config(format!(
                "Refusing unfiltered update on {}",
                self.table
            )));
        }
        tracing::debug!(table = %self.table, params = ?self.params, "Backend update");
        let request = self
            .client
            .http()
            .patch(self.url())
            .query(&self.params)
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.client.authorize(request).send().await?;
        BackendClient::parse_response(response).await
    }

    /// Delete every row matching the filters.
    pub async fn delete(self) -> Result<(), BackendError> {
        if !self.has_filters() {
            return Err(BackendError::Config(format!(
                "Refusing unfiltered delete on {}",
                self.table
            )));
        }
        tracing::debug!(table = %self.table, params = ?self.params, "Backend delete");
        let request = self.client.http().delete(self.url()).query(&self.params);
        let response = self.client.authorize(request).send().await?;
        BackendClient::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> BackendClient {
        BackendClient::new(BackendConfig::new(server.uri(), "anon-key"))
    }

    #[tokio::test]
    async fn fetch_sends_filters_and_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/styles"))
            .and(query_param("select", "id,name"))
            .and(query_param("organization_id", "eq.abc"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "5"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let rows: Vec<Value> = client(&server)
            .with_access_token("user-token")
            .from("styles")
            .select("id,name")
            .eq("organization_id", "abc")
            .order("created_at", false)
            .limit(5)
            .fetch()
            .await
            .unwrap();

        assert_eq!(rows, vec![json!({"id": 1})]);
    }

    #[tokio::test]
    async fn in_filter_quotes_values() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/generations"))
            .and(query_param("id", "in.(\"a\",\"b\")"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .from("generations")
            .in_("id", ["a", "b"])
            .delete()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn repeated_order_becomes_tie_breaker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/styles"))
            .and(query_param("order", "is_default.desc,name.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let rows: Vec<Value> = client(&server)
            .from("styles")
            .order("is_default", false)
            .order("name", true)
            .fetch()
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn unfiltered_delete_is_refused() {
        let server = MockServer::start().await;
        let err = client(&server).from("generations").delete().await.unwrap_err();
        assert_matches!(err, BackendError::Config(_));
    }

    #[tokio::test]
    async fn error_body_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/organizations"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .from("organizations")
            .insert_one::<_, Value>(&json!({"name": "Dup"}))
            .await
            .unwrap_err();
        assert_eq!(
            menuforge_core::error::Classify::kind(&err),
            menuforge_core::error::ErrorKind::AlreadyExists
        );
    }

    #[test]
    fn service_role_requires_key() {
        let anon = BackendClient::new(BackendConfig::new("http://localhost", "anon"));
        assert_matches!(anon.service_role(), Err(BackendError::Config(_)));

        let with_key = BackendClient::new(
            BackendConfig::new("http://localhost", "anon").with_service_key("service"),
        );
        assert!(with_key.service_role().is_ok());
    }
}
