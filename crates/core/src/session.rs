//! Explicit per-session context, including the admin "login as" override.
//!
//! The acting organization is carried on [`SessionContext`] and read
//! through [`SessionContext::effective_organization_id`]; nothing reads it
//! from ambient storage.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::RecordId;

/// Key prefix shared by every persisted auth token.
pub const AUTH_STORAGE_PREFIX: &str = "sb-";

/// Role stored on the user's profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    Client,
}

/// An organization an admin is currently acting as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impersonation {
    pub organization_id: RecordId,
    pub organization_name: String,
}

/// The signed-in user and whom they are acting for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: RecordId,
    pub role: UserRole,
    /// The organization from the user's own profile.
    pub organization_id: Option<RecordId>,
    impersonating: Option<Impersonation>,
}

impl SessionContext {
    pub fn new(user_id: RecordId, role: UserRole, organization_id: Option<RecordId>) -> Self {
        Self {
            user_id,
            role,
            organization_id,
            impersonating: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Act as another organization. Only admins may do this.
    pub fn login_as(
        &mut self,
        organization_id: RecordId,
        organization_name: impl Into<String>,
    ) -> Result<(), CoreError> {
        if !self.is_admin() {
            return Err(CoreError::Forbidden(
                "Only admins can log in as another organization".into(),
            ));
        }
        self.impersonating = Some(Impersonation {
            organization_id,
            organization_name: organization_name.into(),
        });
        Ok(())
    }

    /// Drop the override, returning what was being impersonated.
    pub fn stop_impersonating(&mut self) -> Option<Impersonation> {
        self.impersonating.take()
    }

    pub fn impersonating(&self) -> Option<&Impersonation> {
        self.impersonating.as_ref()
    }

    /// Organization that data reads and writes are scoped to.
    pub fn effective_organization_id(&self) -> Option<RecordId> {
        self.impersonating
            .as_ref()
            .map(|i| i.organization_id)
            .or(self.organization_id)
    }
}
