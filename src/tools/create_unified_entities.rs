use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::memory::types::EntityInput;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateUnifiedEntitiesParams {
    #[schemars(description = "User ID (email, phone, or any alias)")]
    pub user_id: String,

    #[schemars(description = "Interface creating the entities (terminal, whatsapp, ...)")]
    pub interface: String,

    #[schemars(description = "Entities to create")]
    pub entities: Vec<EntityInput>,
}
