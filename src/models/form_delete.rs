use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response returned after deleting a form
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FormDeleteResponse {
    pub message: String,
}
