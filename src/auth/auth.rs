use axum::{http::StatusCode, Json};
use uuid::Uuid;

use crate::models::{AuthUser, ErrorResponse};

/// Parse the caller's user id into a Uuid, rejecting tokens that carry
/// something else in the subject claim.
pub fn ensure_user_id(user: &AuthUser) -> Result<Uuid, (StatusCode, Json<ErrorResponse>)> {
    if let Ok(uuid) = Uuid::parse_str(&user.user_id) {
        return Ok(uuid);
    }

    let status = StatusCode::UNAUTHORIZED;
    Err((
        status,
        Json(ErrorResponse {
            code: status.as_u16(),
            status: status.to_string(),
            error: "Malformed user id in token".to_string(),
        }),
    ))
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if user.is_admin() {
        return Ok(());
    }

    let status = StatusCode::FORBIDDEN;
    Err((
        status,
        Json(ErrorResponse {
            code: status.as_u16(),
            status: status.to_string(),
            error: "Administrator access required".to_string(),
        }),
    ))
}
