//! Repository for the `menu_photos` table, including the 30-day trash.

use menuforge_core::trash;
use menuforge_core::types::{RecordId, Timestamp};

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::models::menu_photo::{CreateMenuPhoto, MenuPhoto};

const TABLE: &str = "menu_photos";

pub struct MenuPhotoRepo;

impl MenuPhotoRepo {
    pub async fn create(
        client: &BackendClient,
        input: &CreateMenuPhoto,
    ) -> Result<MenuPhoto, BackendError> {
        client.from(TABLE).insert_one(input).await
    }

    /// Live photos of an organization, newest first. Excludes trashed rows.
    pub async fn list_active(
        client: &BackendClient,
        organization_id: RecordId,
    ) -> Result<Vec<MenuPhoto>, BackendError> {
        client
            .from(TABLE)
            .eq("organization_id", organization_id)
            .is_null("deleted_at")
            .order("created_at", false)
            .fetch()
            .await
    }

    /// Trashed photos of an organization, most recently deleted first.
    pub async fn list_trashed(
        client: &BackendClient,
        organization_id: RecordId,
    ) -> Result<Vec<MenuPhoto>, BackendError> {
        client
            .from(TABLE)
            .eq("organization_id", organization_id)
            .not_null("deleted_at")
            .order("deleted_at", false)
            .fetch()
            .await
    }

    /// Move a photo to the trash. Returns `true` if a live row was marked.
    pub async fn soft_delete(client: &BackendClient, id: RecordId) -> Result<bool, BackendError> {
        let body = serde_json::json!({ "deleted_at": chrono::Utc::now() });
        let rows: Vec<MenuPhoto> = client
            .from(TABLE)
            .eq("id", id)
            .is_null("deleted_at")
            .update(&body)
            .await?;
        Ok(!rows.is_empty())
    }

    /// Take a photo out of the trash. Returns `true` if a row was restored.
    pub async fn restore(client: &BackendClient, id: RecordId) -> Result<bool, BackendError> {
        let body = serde_json::json!({ "deleted_at": null });
        let rows: Vec<MenuPhoto> = client
            .from(TABLE)
            .eq("id", id)
            .not_null("deleted_at")
            .update(&body)
            .await?;
        Ok(!rows.is_empty())
    }

    /// Permanently delete a photo row.
    pub async fn hard_delete(client: &BackendClient, id: RecordId) -> Result<(), BackendError> {
        client.from(TABLE).eq("id", id).delete().await
    }

    /// Permanently delete photos trashed longer than the retention period.
    ///
    /// Returns the purged rows so the caller can remove their storage
    /// objects.
    pub async fn purge_expired(
        client: &BackendClient,
        organization_id: RecordId,
        now: Timestamp,
    ) -> Result<Vec<MenuPhoto>, BackendError> {
        let cutoff = trash::purge_cutoff(now);
        let expired: Vec<MenuPhoto> = client
            .from(TABLE)
            .eq("organization_id", organization_id)
            .not_null("deleted_at")
            .lte("deleted_at", cutoff.to_rfc3339())
            .fetch()
            .await?;

        if expired.is_empty() {
            return Ok(expired);
        }

        client
            .from(TABLE)
            .in_("id", expired.iter().map(|p| p.id))
            .delete()
            .await?;

        tracing::info!(
            %organization_id,
            purged = expired.len(),
            "Purged expired menu photos from trash",
        );
        Ok(expired)
    }
}
