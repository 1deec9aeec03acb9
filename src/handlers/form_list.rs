use crate::{
    auth::auth,
    db::dbforms,
    models::{AuthUser, ErrorResponse, FormListResponse},
};
use axum::{extract::Extension, http::StatusCode, Json};
use tracing::error;

/// List every form the caller created or collaborates on, newest first
pub async fn form_list(
    Extension(user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<FormListResponse>), (StatusCode, Json<ErrorResponse>)> {
    let user_uuid = auth::ensure_user_id(&user)?;

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

    let forms = match db.list_forms_for_user(user_uuid).await {
        Ok(forms) => forms,
        Err(e) => {
            error!("Form listing failed for user '{}': {}", user_uuid, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Form listing failed: {}", e),
                }),
            ));
        }
    };

    Ok((StatusCode::OK, Json(FormListResponse { forms })))
}
