use crate::{
    auth::auth,
    db::dbforms,
    models::{AuthUser, ErrorResponse, FormJoinRequest, FormJoinResponse},
};
use axum::{extract::Extension, http::StatusCode, Json};
use tracing::{error, info};
use uuid::Uuid;

/// Join a form as collaborator, by share code or by form id
///
/// The share code field accepts either an 8-character code or a full
/// form UUID; clients paste whatever was shared with them.
pub async fn form_join(
    Extension(user): Extension<AuthUser>,
    Json(request): Json<FormJoinRequest>,
) -> Result<(StatusCode, Json<FormJoinResponse>), (StatusCode, Json<ErrorResponse>)> {
    let user_uuid = auth::ensure_user_id(&user)?;

    let input = request.share_code.trim().to_string();
    if input.is_empty() {
        let status = StatusCode::BAD_REQUEST;
        return Err((
            status,
            Json(ErrorResponse {
                code: status.as_u16(),
                status: status.to_string(),
                error: "Share code is required".to_string(),
            }),
        ));
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

    // A UUID-shaped input is treated as a form id, anything else as a
    // share code
    let lookup = match Uuid::parse_str(&input) {
        Ok(form_uuid) => db.find_active_form(form_uuid).await,
        Err(_) => db.find_form_by_share_code(&input.to_uppercase()).await,
    };
    let form = match lookup {
        Ok(Some(form)) => form,
        Ok(None) => {
            let status = StatusCode::NOT_FOUND;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: "Invalid share code or form not found".to_string(),
                }),
            ));
        }
        Err(e) => {
            error!("Form lookup failed for '{}': {}", input, e);
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

    // The creator never becomes their own collaborator
    if form.created_by == user_uuid {
        return Ok((
            StatusCode::OK,
            Json(FormJoinResponse {
                message: "You are the creator of this form".to_string(),
                form_id: form.id,
                user_role: "creator".to_string(),
                form_title: None,
            }),
        ));
    }

    let existing = match db.is_collaborator(form.id, user_uuid).await {
        Ok(existing) => existing,
        Err(e) => {
            error!("Collaborator check failed for '{}': {}", form.id, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Collaborator check failed: {}", e),
                }),
            ));
        }
    };

    if !existing {
        if let Err(e) = db.add_collaborator(form.id, user_uuid).await {
            error!("Adding collaborator to '{}' failed: {}", form.id, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Adding collaborator failed: {}", e),
                }),
            ));
        }
        info!("User '{}' joined form '{}'", user_uuid, form.id);
    }

    let user_role = if existing {
        "existing_collaborator"
    } else {
        "new_collaborator"
    };
    Ok((
        StatusCode::OK,
        Json(FormJoinResponse {
            message: "Successfully joined form".to_string(),
            form_id: form.id,
            user_role: user_role.to_string(),
            form_title: Some(form.title),
        }),
    ))
}
