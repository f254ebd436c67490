//! Style preset model and DTOs.

use menuforge_core::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

/// A row from the `styles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub id: RecordId,
    /// `None` for global styles visible to every organization.
    pub organization_id: Option<RecordId>,
    pub name: String,
    /// Text appended to the user's prompt.
    pub prompt_modifier: String,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: Timestamp,
}

impl Style {
    pub fn is_global(&self) -> bool {
        self.organization_id.is_none()
    }
}

/// DTO for creating a style.
#[derive(Debug, Clone, Serialize)]
pub struct CreateStyle {
    pub organization_id: Option<RecordId>,
    pub name: String,
    pub prompt_modifier: String,
    pub is_default: bool,
}

/// DTO for updating a style. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_modifier: Option<String>,
}
