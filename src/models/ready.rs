use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body served by the readiness endpoint
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct ReadyResponse {
    pub status: String,
    pub message: String,
}
