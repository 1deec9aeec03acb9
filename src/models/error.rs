use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body every REST endpoint returns alongside a non-2xx status
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct ErrorResponse {
    /// Numeric HTTP status code
    pub code: u16,
    /// Status line text, e.g. "404 Not Found"
    pub status: String,
    /// What went wrong
    pub error: String,
}
