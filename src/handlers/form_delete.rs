use crate::{
    auth::auth,
    collab::SessionRegistry,
    db::dbforms,
    models::{AuthUser, ErrorResponse, FormDeleteResponse},
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Delete a form. Only the creator may do this; anyone else sees the
/// same not-found answer as for a missing form.
pub async fn form_delete(
    State(registry): State<Arc<SessionRegistry>>,
    Extension(user): Extension<AuthUser>,
    Path(form_id): Path<String>,
) -> Result<(StatusCode, Json<FormDeleteResponse>), (StatusCode, Json<ErrorResponse>)> {
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

    // Delete, constrained to the creator
    match db.delete_form(form_uuid, user_uuid).await {
        Ok(true) => info!("Form '{}' deleted by user '{}'", form_uuid, user_uuid),
        Ok(false) => {
            let status = StatusCode::NOT_FOUND;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: "Form not found or access denied".to_string(),
                }),
            ));
        }
        Err(e) => {
            error!("Form deletion failed for '{}': {}", form_uuid, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Form deletion failed: {}", e),
                }),
            ));
        }
    }

    // Drop the live editing session, if one is running
    if registry.close_session(&form_id) {
        info!("Closed live session for deleted form '{}'", form_id);
    }

    Ok((
        StatusCode::OK,
        Json(FormDeleteResponse {
            message: "Form deleted successfully".to_string(),
        }),
    ))
}
