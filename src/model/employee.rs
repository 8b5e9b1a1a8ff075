use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 2,
        "name": "María López",
        "sensor_id": 2,
        "branch_id": 1
    })
)]
pub struct Employee {
    #[schema(example = 2)]
    pub id: u64,

    #[schema(example = "María López")]
    pub name: String,

    /// Slot reported by the fingerprint sensor. Unique across all branches.
    #[schema(example = 2)]
    pub sensor_id: u32,

    #[schema(example = 1)]
    pub branch_id: u64,
}
