//! MCP `search_unified_memory` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::memory::search::SearchScope;

/// Parameters for the `search_unified_memory` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchUnifiedMemoryParams {
    #[schemars(description = "User ID (email, phone, or any alias)")]
    pub user_id: String,

    #[schemars(description = "Case-insensitive text to look for. Empty matches everything.")]
    pub query: String,

    #[schemars(description = "Max results per category (default: 10)")]
    #[serde(default)]
    pub max_results: Option<usize>,

    #[schemars(
        description = "Only consider messages and observations from this interface (e.g. 'terminal', 'whatsapp')"
    )]
    #[serde(default)]
    pub interface: Option<String>,

    #[schemars(description = "What to search: 'messages', 'entities' or 'all' (default)")]
    #[serde(default)]
    pub search_type: Option<SearchScope>,
}
