use crate::{
    auth::auth,
    db::dbforms,
    models::{AuthUser, ErrorResponse, FieldView, FormDetail, FormGetResponse},
};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use tracing::{debug, error};
use uuid::Uuid;

/// Fetch one form with its fields, current response and creator name
pub async fn form_get(
    Extension(user): Extension<AuthUser>,
    Path(form_id): Path<String>,
) -> Result<(StatusCode, Json<FormGetResponse>), (StatusCode, Json<ErrorResponse>)> {
    let user_uuid = auth::ensure_user_id(&user)?;

    // Parse form id
    let form_uuid = match Uuid::parse_str(&form_id) {
        Ok(uuid) => uuid,
        Err(e) => {
            error!("Invalid form UUID '{}': {}", form_id, e);
            let status = StatusCode::BAD_REQUEST;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Invalid form UUID '{}'", form_id),
                }),
            ));
        }
    };

    // Fetch database handle
    let db = match dbforms::get_db() {
        Some(db) => db,
        None => {
            error!("Database not configured");
            let status = StatusCode::SERVICE_UNAVAILABLE;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: "Form storage is not configured".to_string(),
                }),
            ));
        }
    };

    // Load the form row
    let form = match db.get_form(form_uuid).await {
        Ok(Some(form)) => form,
        Ok(None) => {
            let status = StatusCode::NOT_FOUND;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: "Form not found".to_string(),
                }),
            ));
        }
        Err(e) => {
            error!("Form lookup failed for '{}': {}", form_uuid, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Form lookup failed: {}", e),
                }),
            ));
        }
    };

    // Check the caller may see it
    let has_access = match db.has_form_access(form_uuid, user_uuid).await {
        Ok(has_access) => has_access,
        Err(e) => {
            error!("Access check failed for '{}': {}", form_uuid, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Access check failed: {}", e),
                }),
            ));
        }
    };
    if !has_access {
        let status = StatusCode::FORBIDDEN;
        return Err((
            status,
            Json(ErrorResponse {
                code: status.as_u16(),
                status: status.to_string(),
                error: "Access denied to this form".to_string(),
            }),
        ));
    }

    // Field rows in declared order, reshaped for the editing view
    let fields: Vec<FieldView> = match db.get_form_fields(form_uuid).await {
        Ok(rows) => rows.into_iter().map(FieldView::from).collect(),
        Err(e) => {
            error!("Field lookup failed for '{}': {}", form_uuid, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Field lookup failed: {}", e),
                }),
            ));
        }
    };

    // Current consolidated response, empty when none was stored yet
    let response = match db.get_form_response(form_uuid).await {
        Ok(Some(row)) => row.response_data,
        Ok(None) => serde_json::json!({}),
        Err(e) => {
            error!("Response lookup failed for '{}': {}", form_uuid, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Response lookup failed: {}", e),
                }),
            ));
        }
    };

    // Creator display name if the users table knows them
    let created_by_username = match db.get_username(form.created_by).await {
        Ok(name) => name,
        Err(e) => {
            error!("Username lookup failed for '{}': {}", form.created_by, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Username lookup failed: {}", e),
                }),
            ));
        }
    };

    debug!("Serving form '{}' to user '{}'", form_uuid, user_uuid);

    Ok((
        StatusCode::OK,
        Json(FormGetResponse {
            form: FormDetail {
                form,
                created_by_username,
                fields,
                response,
            },
        }),
    ))
}
