//! Repository for the `profiles` table.

use menuforge_core::types::RecordId;

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::models::profile::Profile;

const TABLE: &str = "profiles";

pub struct ProfileRepo;

impl ProfileRepo {
    /// Find the profile of an auth user.
    pub async fn find_by_id(
        client: &BackendClient,
        id: RecordId,
    ) -> Result<Option<Profile>, BackendError> {
        client.from(TABLE).eq("id", id).fetch_optional().await
    }

    pub async fn list_by_organization(
        client: &BackendClient,
        organization_id: RecordId,
    ) -> Result<Vec<Profile>, BackendError> {
        client
            .from(TABLE)
            .eq("organization_id", organization_id)
            .order("created_at", true)
            .fetch()
            .await
    }

    /// Move a user into (or out of) an organization.
    pub async fn set_organization(
        client: &BackendClient,
        id: RecordId,
        organization_id: Option<RecordId>,
    ) -> Result<Option<Profile>, BackendError> {
        let body = serde_json::json!({ "organization_id": organization_id });
        let rows: Vec<Profile> = client.from(TABLE).eq("id", id).update(&body).await?;
        Ok(rows.into_iter().next())
    }
}
