//! MCP `sync_conversation_state` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::memory::types::IncomingMessage;

/// Parameters for the `sync_conversation_state` MCP tool.
///
/// Messages identical in every field (after interface and timestamp stamping)
/// to one already stored are skipped.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncConversationStateParams {
    #[schemars(description = "User ID (email, phone, or any alias)")]
    pub user_id: String,

    #[schemars(description = "Source interface")]
    pub interface: String,

    #[schemars(description = "Messages to sync")]
    pub messages: Vec<IncomingMessage>,

    #[schemars(description = "Optional summary of the conversation so far; replaces the stored one")]
    #[serde(default)]
    pub context_summary: Option<String>,
}
