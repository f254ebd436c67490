//! Repository for the `organizations` table.

use menuforge_core::types::RecordId;

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};

const TABLE: &str = "organizations";

/// Provides CRUD operations for organizations.
pub struct OrganizationRepo;

impl OrganizationRepo {
    /// List all organizations, alphabetically.
    pub async fn list(client: &BackendClient) -> Result<Vec<Organization>, BackendError> {
        client.from(TABLE).order("name", true).fetch().await
    }

    pub async fn find_by_id(
        client: &BackendClient,
        id: RecordId,
    ) -> Result<Option<Organization>, BackendError> {
        client.from(TABLE).eq("id", id).fetch_optional().await
    }

    pub async fn create(
        client: &BackendClient,
        input: &CreateOrganization,
    ) -> Result<Organization, BackendError> {
        client.from(TABLE).insert_one(input).await
    }

    /// Update an organization. Returns `None` if no row with `id` exists.
    pub async fn update(
        client: &BackendClient,
        id: RecordId,
        input: &UpdateOrganization,
    ) -> Result<Option<Organization>, BackendError> {
        let rows: Vec<Organization> = client.from(TABLE).eq("id", id).update(input).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn delete(client: &BackendClient, id: RecordId) -> Result<(), BackendError> {
        client.from(TABLE).eq("id", id).delete().await
    }
}
