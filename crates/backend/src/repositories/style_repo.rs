//! Repository for the `styles` table.
//!
//! Styles are either global (`organization_id IS NULL`) or owned by one
//! organization. At most one style per scope is flagged as default.

use menuforge_core::prompt::validate_style_name;
use menuforge_core::types::RecordId;

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::models::style::{CreateStyle, Style, UpdateStyle};

const TABLE: &str = "styles";

pub struct StyleRepo;

impl StyleRepo {
    /// Styles an organization can pick from: every global style plus its own.
    ///
    /// With `None`, only global styles are returned. Defaults sort first.
    pub async fn list_visible(
        client: &BackendClient,
        organization_id: Option<RecordId>,
    ) -> Result<Vec<Style>, BackendError> {
        let query = client.from(TABLE);
        let query = match organization_id {
            Some(org) => query.or(&format!(
                "organization_id.is.null,organization_id.eq.{org}"
            )),
            None => query.is_null("organization_id"),
        };
        query
            .order("is_default", false)
            .order("name", true)
            .fetch()
            .await
    }

    pub async fn find_by_id(
        client: &BackendClient,
        id: RecordId,
    ) -> Result<Option<Style>, BackendError> {
        client.from(TABLE).eq("id", id).fetch_optional().await
    }

    /// Create a style. A new default style clears the previous default.
    pub async fn create(client: &BackendClient, input: &CreateStyle) -> Result<Style, BackendError> {
        validate_style_name(&input.name)?;
        if input.is_default {
            Self::clear_default(client, input.organization_id).await?;
        }
        client.from(TABLE).insert_one(input).await
    }

    pub async fn update(
        client: &BackendClient,
        id: RecordId,
        input: &UpdateStyle,
    ) -> Result<Option<Style>, BackendError> {
        if let Some(name) = &input.name {
            validate_style_name(name)?;
        }
        let rows: Vec<Style> = client.from(TABLE).eq("id", id).update(input).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn delete(client: &BackendClient, id: RecordId) -> Result<(), BackendError> {
        client.from(TABLE).eq("id", id).delete().await
    }

    /// Make `style` the default of its scope.
    pub async fn set_default(client: &BackendClient, style: &Style) -> Result<(), BackendError> {
        Self::clear_default(client, style.organization_id).await?;
        let _: Vec<Style> = client
            .from(TABLE)
            .eq("id", style.id)
            .update(&serde_json::json!({ "is_default": true }))
            .await?;
        tracing::info!(style_id = %style.id, "Default style changed");
        Ok(())
    }

    async fn clear_default(
        client: &BackendClient,
        organization_id: Option<RecordId>,
    ) -> Result<(), BackendError> {
        let query = client.from(TABLE).eq("is_default", true);
        let query = match organization_id {
            Some(org) => query.eq("organization_id", org),
            None => query.is_null("organization_id"),
        };
        let _: Vec<Style> = query
            .update(&serde_json::json!({ "is_default": false }))
            .await?;
        Ok(())
    }
}
