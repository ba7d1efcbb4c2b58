use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::memory::types::ObservationInput;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddObservationsParams {
    #[schemars(description = "User ID (email, phone, or any alias)")]
    pub user_id: String,

    #[schemars(description = "Interface adding the observations")]
    pub interface: String,

    #[schemars(description = "Observations grouped by entity name")]
    pub observations: Vec<ObservationInput>,
}
