//! Organization (tenant) model and DTOs.

use menuforge_core::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

/// A row from the `organizations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: RecordId,
    pub name: String,
    pub slug: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a new organization.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrganization {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// DTO for updating an organization. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateOrganization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}
