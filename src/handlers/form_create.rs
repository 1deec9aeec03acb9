use crate::{
    auth::auth,
    db::dbforms,
    models::{AuthUser, CreateFormRequest, CreateFormResponse, CreatedForm, ErrorResponse},
    services::form_service,
};
use axum::{extract::Extension, http::StatusCode, Json};
use tracing::{error, info};

/// Create a form with its field definitions and an empty initial response
pub async fn form_create(
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateFormRequest>,
) -> Result<(StatusCode, Json<CreateFormResponse>), (StatusCode, Json<ErrorResponse>)> {
    let user_uuid = auth::ensure_user_id(&user)?;

    // Validate the request shape
    if request.title.is_empty() || request.fields.is_empty() {
        let status = StatusCode::BAD_REQUEST;
        return Err((
            status,
            Json(ErrorResponse {
                code: status.as_u16(),
                status: status.to_string(),
                error: "Title and fields are required".to_string(),
            }),
        ));
    }
    for (i, field) in request.fields.iter().enumerate() {
        if field.name.is_empty() || field.field_type.is_empty() || field.label.is_empty() {
            let status = StatusCode::BAD_REQUEST;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!(
                        "Field {} is missing required properties (name, type, label)",
                        i + 1
                    ),
                }),
            ));
        }
    }

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

    // Generate a share code that is not in use yet
    let share_code = match form_service::unique_share_code(&db).await {
        Ok(code) => code,
        Err(e) => {
            error!("Share code generation failed: {}", e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: e,
                }),
            ));
        }
    };

    // Store the form, its fields and the empty initial response
    let (form, fields) = match db
        .create_form_with_fields(
            &request.title,
            request.description.as_deref(),
            user_uuid,
            &share_code,
            &request.fields,
        )
        .await
    {
        Ok(created) => created,
        Err(e) => {
            error!("Form creation failed: {}", e);
            let duplicate = e
                .as_database_error()
                .and_then(|d| d.code())
                .map(|c| c == "23505")
                .unwrap_or(false);
            let message = if duplicate {
                "Duplicate share code generated".to_string()
            } else {
                format!("Form creation failed: {}", e)
            };
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: message,
                }),
            ));
        }
    };

    info!("Form '{}' created by user '{}'", form.id, user_uuid);

    Ok((
        StatusCode::CREATED,
        Json(CreateFormResponse {
            form: CreatedForm { form, fields },
        }),
    ))
}
