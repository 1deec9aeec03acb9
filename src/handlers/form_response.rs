use crate::{
    auth::auth,
    db::dbforms::{get_db, DbForms},
    models::{AuthUser, ErrorResponse, PatchResponseRequest, ResponseSaved, SaveResponseRequest},
};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// Replace the consolidated response document of a form
pub async fn save_response(
    Extension(user): Extension<AuthUser>,
    Path(form_id): Path<String>,
    Json(request): Json<SaveResponseRequest>,
) -> Result<(StatusCode, Json<ResponseSaved>), (StatusCode, Json<ErrorResponse>)> {
    let user_uuid = auth::ensure_user_id(&user)?;
    let (db, form_uuid) = resolve_form(&form_id, user_uuid).await?;

    let existed = current_response(&db, form_uuid).await?.is_some();
    let row = match db
        .upsert_form_response(form_uuid, &request.response, user_uuid)
        .await
    {
        Ok(row) => row,
        Err(e) => {
            error!("Response save failed for '{}': {}", form_uuid, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Response save failed: {}", e),
                }),
            ));
        }
    };

    debug!("Response for form '{}' saved by '{}'", form_uuid, user_uuid);

    Ok((
        StatusCode::OK,
        Json(ResponseSaved {
            message: saved_message(existed),
            response: row,
        }),
    ))
}

/// Merge a single field value into the consolidated response document
///
/// This is the explicit save path paired with the realtime relay, which
/// itself never persists anything.
pub async fn patch_response(
    Extension(user): Extension<AuthUser>,
    Path(form_id): Path<String>,
    Json(request): Json<PatchResponseRequest>,
) -> Result<(StatusCode, Json<ResponseSaved>), (StatusCode, Json<ErrorResponse>)> {
    let user_uuid = auth::ensure_user_id(&user)?;
    let (db, form_uuid) = resolve_form(&form_id, user_uuid).await?;

    let current = current_response(&db, form_uuid).await?;
    let existed = current.is_some();

    // Merge the one field into whatever is stored, starting fresh when
    // nothing is stored or the stored value is not an object
    let mut merged = match current.and_then(|row| match row.response_data {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }) {
        Some(map) => map,
        None => serde_json::Map::new(),
    };
    merged.insert(request.field_id.clone(), request.value);
    let merged = serde_json::Value::Object(merged);

    let row = match db.upsert_form_response(form_uuid, &merged, user_uuid).await {
        Ok(row) => row,
        Err(e) => {
            error!("Response patch failed for '{}': {}", form_uuid, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Response patch failed: {}", e),
                }),
            ));
        }
    };

    debug!(
        "Field '{}' of form '{}' saved by '{}'",
        request.field_id, form_uuid, user_uuid
    );

    Ok((
        StatusCode::OK,
        Json(ResponseSaved {
            message: saved_message(existed),
            response: row,
        }),
    ))
}

fn saved_message(existed: bool) -> String {
    if existed {
        "Response updated successfully".to_string()
    } else {
        "Response created successfully".to_string()
    }
}

/// Parse the form id and make sure the caller may write its response.
/// A form the caller cannot see reads as not found.
async fn resolve_form(
    form_id: &str,
    user_uuid: Uuid,
) -> Result<(Arc<DbForms>, Uuid), (StatusCode, Json<ErrorResponse>)> {
    let form_uuid = match Uuid::parse_str(form_id) {
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
    let db = match get_db() {
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

    Ok((db, form_uuid))
}

async fn current_response(
    db: &DbForms,
    form_uuid: Uuid,
) -> Result<Option<crate::models::FormResponseRow>, (StatusCode, Json<ErrorResponse>)> {
    match db.get_form_response(form_uuid).await {
        Ok(row) => Ok(row),
        Err(e) => {
            error!("Response lookup failed for '{}': {}", form_uuid, e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            Err((
                status,
                Json(ErrorResponse {
                    code: status.as_u16(),
                    status: status.to_string(),
                    error: format!("Response lookup failed: {}", e),
                }),
            ))
        }
    }
}
