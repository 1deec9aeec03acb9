use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body served by the liveness endpoint
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
