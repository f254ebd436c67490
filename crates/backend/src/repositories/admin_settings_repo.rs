//! Repository for the `admin_settings` table.

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::models::admin_setting::AdminSetting;

const TABLE: &str = "admin_settings";

pub struct AdminSettingsRepo;

impl AdminSettingsRepo {
    pub async fn get(
        client: &BackendClient,
        key: &str,
    ) -> Result<Option<AdminSetting>, BackendError> {
        client.from(TABLE).eq("key", key).fetch_optional().await
    }

    /// Read a setting as text, `None` when missing or blank.
    pub async fn get_text(client: &BackendClient, key: &str) -> Result<Option<String>, BackendError> {
        Ok(Self::get(client, key)
            .await?
            .and_then(|s| s.as_text().map(str::to_string)))
    }

    /// Create or replace a setting.
    pub async fn upsert(
        client: &BackendClient,
        key: &str,
        value: serde_json::Value,
    ) -> Result<AdminSetting, BackendError> {
        let body = serde_json::json!({
            "key": key,
            "value": value,
            "updated_at": chrono::Utc::now(),
        });
        client
            .from(TABLE)
            .upsert::<_, AdminSetting>(&body, "key")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode(format!("Upsert of setting {key} returned no rows")))
    }
}
