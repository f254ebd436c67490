//! Image generation model, DTOs, and the light/heavy column projections
//! used by the history loader.

use menuforge_core::types::{RecordId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};

/// A full row from the `generations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub id: RecordId,
    pub organization_id: Option<RecordId>,
    pub user_id: Option<RecordId>,
    pub prompt: String,
    /// Hosted URLs or base64 `data:` URLs. Can be large.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
    pub ratio: String,
    pub resolution: String,
    pub created_at: Timestamp,
}

/// Columns cheap enough to fetch for a whole page.
pub const SUMMARY_COLUMNS: &str = "id,prompt,ratio,resolution,created_at";

/// Columns fetched lazily, a few rows at a time.
pub const IMAGE_COLUMNS: &str = "id,images";

/// Metadata-only projection of a generation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationSummary {
    pub id: RecordId,
    pub prompt: String,
    pub ratio: String,
    pub resolution: String,
    pub created_at: Timestamp,
}

/// The heavy `images` column for one generation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationImages {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
}

/// The `images` column is nullable; a null reads as no images.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// DTO for storing a completed generation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateGeneration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<RecordId>,
    pub prompt: String,
    pub images: Vec<String>,
    pub ratio: String,
    pub resolution: String,
}
