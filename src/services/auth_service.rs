use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};

use crate::models::AuthUser;

// Get the auth token from request headers
pub fn get_auth_token(headers: &HeaderMap) -> Result<String, String> {
    // 1. Try to get token from Authorization header
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header".to_string())?;
        Ok(auth_str
            .strip_prefix("Bearer ")
            .unwrap_or(auth_str)
            .to_string())
    }
    // 2. Try to get token from cookies
    else {
        let cookie_header = headers
            .get(header::COOKIE)
            .ok_or_else(|| "Missing Authorization header or Cookie".to_string())?
            .to_str()
            .map_err(|_| "Invalid Cookie header".to_string())?;

        for cookie in cookie::Cookie::split_parse(cookie_header) {
            if let Ok(c) = cookie {
                if c.name() == "auth_token" {
                    return Ok(c.value().to_string());
                }
            }
        }
        Err("auth_token cookie not found".to_string())
    }
}

// Validate a JWT token and return the token data
pub fn validate_jwt(
    token: &str,
    secret: &str,
) -> Result<TokenData<serde_json::Value>, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<serde_json::Value>(token, &decoding_key, &validation)
}

// Build the user context from validated JWT claims
pub fn auth_user_from_claims(claims: &serde_json::Value) -> Result<AuthUser, String> {
    let user_id = claims
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "JWT token does not contain 'userId' claim".to_string())?;
    let email = claims
        .get("email")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let role = claims
        .get("role")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    Ok(AuthUser {
        user_id: user_id.to_string(),
        email,
        role,
    })
}
