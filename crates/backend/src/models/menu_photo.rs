//! Uploaded menu photo model and DTOs.

use menuforge_core::trash;
use menuforge_core::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

/// A row from the `menu_photos` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuPhoto {
    pub id: RecordId,
    pub organization_id: RecordId,
    /// Object path inside the storage bucket.
    pub storage_path: String,
    pub file_name: String,
    /// Set when the photo is in the trash.
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl MenuPhoto {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Days until a trashed photo is purged; `None` when not trashed.
    pub fn days_until_purge(&self, now: Timestamp) -> Option<i64> {
        self.deleted_at
            .map(|deleted_at| trash::days_remaining(deleted_at, now))
    }
}

/// DTO for recording an uploaded photo.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMenuPhoto {
    pub organization_id: RecordId,
    pub storage_path: String,
    pub file_name: String,
}
