use std::sync::Arc;

use menuforge_backend::auth::AuthClient;
use menuforge_backend::storage::StorageClient;
use menuforge_backend::BackendClient;
use menuforge_gateway::GatewayApi;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Anonymous backend client; scope it per request with
    /// [`BackendClient::with_access_token`].
    pub backend: BackendClient,
    pub auth: AuthClient,
    pub gateway: GatewayApi,
    /// Service-role storage, present only when a service key is configured.
    pub storage: Option<StorageClient>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let http = reqwest::Client::new();
        let backend = BackendClient::with_client(http.clone(), config.backend.clone());
        let storage = backend.service_role().ok().map(StorageClient::new);
        if storage.is_none() {
            tracing::warn!("BACKEND_SERVICE_KEY not set, generated images will not be persisted");
        }

        Self {
            auth: AuthClient::new(backend.clone()),
            gateway: GatewayApi::with_client(http, config.gateway.clone()),
            storage,
            backend,
            config: Arc::new(config),
        }
    }

    /// Client for reading admin settings: the service role when available,
    /// else the caller's own token.
    pub fn settings_client(&self, access_token: &str) -> BackendClient {
        self.backend
            .service_role()
            .unwrap_or_else(|_| self.backend.with_access_token(access_token))
    }
}
