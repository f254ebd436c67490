//! Global key/value settings managed from the admin panel.

use menuforge_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Admin setting holding the chat assistant's system prompt.
pub const CHAT_SYSTEM_PROMPT: &str = "chat_system_prompt";

/// Admin setting holding text prepended to every image prompt.
pub const IMAGE_PROMPT_PREFIX: &str = "image_prompt_prefix";

/// A row from the `admin_settings` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSetting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: Option<Timestamp>,
}

impl AdminSetting {
    /// The value when it is a non-blank JSON string.
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_str().map(str::trim).filter(|s| !s.is_empty())
    }
}
