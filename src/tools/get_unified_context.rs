//! MCP `get_unified_context` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `get_unified_context` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetUnifiedContextParams {
    #[schemars(description = "User ID (email, phone, or any alias)")]
    pub user_id: String,

    /// Defaults to `context.default_max_messages` (20).
    #[schemars(description = "Max messages to return (default: 20)")]
    #[serde(default)]
    pub max_messages: Option<usize>,

    #[schemars(description = "Include stored messages (default: true). When false only the summary, entities and message_count are returned")]
    #[serde(default)]
    pub include_history: Option<bool>,
}
