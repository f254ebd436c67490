//! User profile model.

use menuforge_core::session::{SessionContext, UserRole};
use menuforge_core::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

/// A row from the `profiles` table. `id` equals the auth user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: RecordId,
    pub organization_id: Option<RecordId>,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: Timestamp,
}

impl Profile {
    /// Start a session context for this profile's owner.
    pub fn session_context(&self) -> SessionContext {
        SessionContext::new(self.id, self.role, self.organization_id)
    }
}
