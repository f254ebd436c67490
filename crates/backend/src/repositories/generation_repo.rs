//! Repository for the `generations` table.
//!
//! Reads are split into a cheap metadata projection and a heavy `images`
//! projection so the history view can render before image payloads arrive.

use async_trait::async_trait;
use menuforge_core::types::RecordId;

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::history::GenerationStore;
use crate::models::generation::{
    CreateGeneration, Generation, GenerationImages, GenerationSummary, IMAGE_COLUMNS,
    SUMMARY_COLUMNS,
};

const TABLE: &str = "generations";

pub struct GenerationRepo;

impl GenerationRepo {
    pub async fn create(
        client: &BackendClient,
        input: &CreateGeneration,
    ) -> Result<Generation, BackendError> {
        client.from(TABLE).insert_one(input).await
    }

    /// Metadata of the newest `limit` generations, optionally scoped to an
    /// organization.
    pub async fn list_summaries(
        client: &BackendClient,
        organization_id: Option<RecordId>,
        limit: usize,
    ) -> Result<Vec<GenerationSummary>, BackendError> {
        let mut query = client.from(TABLE).select(SUMMARY_COLUMNS);
        if let Some(org) = organization_id {
            query = query.eq("organization_id", org);
        }
        query.order("created_at", false).limit(limit).fetch().await
    }

    /// The `images` column for the given ids.
    pub async fn fetch_images(
        client: &BackendClient,
        ids: &[RecordId],
    ) -> Result<Vec<GenerationImages>, BackendError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        client
            .from(TABLE)
            .select(IMAGE_COLUMNS)
            .in_("id", ids)
            .fetch()
            .await
    }

    pub async fn delete(client: &BackendClient, id: RecordId) -> Result<(), BackendError> {
        client.from(TABLE).eq("id", id).delete().await
    }

    /// Delete several generations with a single request.
    pub async fn delete_many(client: &BackendClient, ids: &[RecordId]) -> Result<(), BackendError> {
        if ids.is_empty() {
            return Ok(());
        }
        client.from(TABLE).in_("id", ids).delete().await
    }
}

#[async_trait]
impl GenerationStore for BackendClient {
    async fn list_summaries(
        &self,
        organization_id: Option<RecordId>,
        limit: usize,
    ) -> Result<Vec<GenerationSummary>, BackendError> {
        GenerationRepo::list_summaries(self, organization_id, limit).await
    }

    async fn fetch_images(&self, ids: &[RecordId]) -> Result<Vec<GenerationImages>, BackendError> {
        GenerationRepo::fetch_images(self, ids).await
    }

    async fn delete(&self, id: RecordId) -> Result<(), BackendError> {
        GenerationRepo::delete(self, id).await
    }

    async fn delete_many(&self, ids: &[RecordId]) -> Result<(), BackendError> {
        GenerationRepo::delete_many(self, ids).await
    }
}
