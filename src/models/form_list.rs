use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::form::FormSummary;

/// Response listing every form the user owns or collaborates on
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FormListResponse {
    pub forms: Vec<FormSummary>,
}
