use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Form row from the database
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct FormRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub share_code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Form field row from the database
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct FormFieldRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub field_name: String,
    pub field_type: String,
    pub field_label: String,
    pub field_options: Option<serde_json::Value>,
    pub field_placeholder: Option<String>,
    pub is_required: bool,
    pub field_order: i32,
}

/// Form response row from the database
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct FormResponseRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub response_data: serde_json::Value,
    pub last_updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// A form together with its field rows, as listed on the dashboard
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FormSummary {
    #[serde(flatten)]
    pub form: FormRow,
    pub form_fields: Vec<FormFieldRow>,
}

/// Field shape served to the editing view
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FieldView {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub options: Option<serde_json::Value>,
    pub required: bool,
    pub placeholder: String,
}

impl From<FormFieldRow> for FieldView {
    fn from(row: FormFieldRow) -> Self {
        Self {
            id: row.id,
            name: row.field_name,
            field_type: row.field_type,
            label: row.field_label,
            options: row.field_options,
            required: row.is_required,
            placeholder: row.field_placeholder.unwrap_or_default(),
        }
    }
}

/// Full form payload for the editing view
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FormDetail {
    #[serde(flatten)]
    pub form: FormRow,
    pub created_by_username: Option<String>,
    pub fields: Vec<FieldView>,
    pub response: serde_json::Value,
}
