use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::form::FormResponseRow;

/// Request payload replacing the whole response document
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SaveResponseRequest {
    pub response: serde_json::Value,
}

/// Request payload writing a single field value
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchResponseRequest {
    pub field_id: String,
    pub value: serde_json::Value,
}

/// Response after saving a form response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ResponseSaved {
    pub message: String,
    pub response: FormResponseRow,
}
