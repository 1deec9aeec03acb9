use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::form::{FormFieldRow, FormRow};

/// Request payload for creating a form
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateFormRequest {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<NewFormField>,
}

/// One field definition in a create request
#[derive(Serialize, Deserialize, ToSchema)]
pub struct NewFormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub options: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    pub placeholder: Option<String>,
}

/// The created form together with its stored field rows
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreatedForm {
    #[serde(flatten)]
    pub form: FormRow,
    pub fields: Vec<FormFieldRow>,
}

/// Response after creating a form
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateFormResponse {
    pub form: CreatedForm,
}
