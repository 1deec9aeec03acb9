use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::{debug, error};

use crate::config;
use crate::services::auth_service::{auth_user_from_claims, get_auth_token, validate_jwt};

pub async fn auth_middleware(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    // 1. Get the auth token from the request
    let token = match get_auth_token(req.headers()) {
        Ok(token) => token,
        Err(_) => return Err(StatusCode::UNAUTHORIZED),
    };

    // 2. Validate the token against the configured secret
    let config = config::get_config();
    let secret = match &config.auth_jwt_secret {
        Some(secret) => secret,
        None => {
            error!("Auth JWT secret not configured");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let token_data = match validate_jwt(&token, secret) {
        Ok(token_data) => token_data,
        Err(e) => {
            error!("JWT validation failed: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // 3. Extract the caller identity from the claims
    let user = match auth_user_from_claims(&token_data.claims) {
        Ok(user) => user,
        Err(e) => {
            error!("JWT claims rejected: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };
    debug!("Token validated for user {}", user.user_id);

    // 4. Set the identity into request extensions for downstream handlers
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
