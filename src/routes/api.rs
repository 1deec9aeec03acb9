use crate::{
    collab::SessionRegistry,
    handlers::{
        diagnostics, form_create, form_delete, form_get, form_join, form_list, health_check,
        patch_response, ready_check, save_response,
    },
    routes::auth_middleware::auth_middleware,
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes(registry: Arc<SessionRegistry>) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check));

    let protected = Router::<Arc<SessionRegistry>>::new()
        .route("/v1/diagnostics", get(diagnostics))
        .route("/forms", post(form_create).get(form_list))
        .route("/forms/join", post(form_join))
        .route("/forms/:form_id", get(form_get).delete(form_delete))
        .route(
            "/forms/:form_id/response",
            post(save_response).patch(patch_response),
        )
        .route_layer(middleware::from_fn(auth_middleware)) // Applies to all routes added above
        .with_state(registry);

    public.merge(protected)
}
