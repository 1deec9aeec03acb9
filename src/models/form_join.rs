use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request payload for joining a form by share code or form id
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormJoinRequest {
    pub share_code: String,
}

/// Response after joining a form
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormJoinResponse {
    pub message: String,
    pub form_id: Uuid,
    pub user_role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_title: Option<String>,
}
