use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::form::FormDetail;

/// Response for fetching one form with its fields and current response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FormGetResponse {
    pub form: FormDetail,
}
