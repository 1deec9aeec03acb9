mod auth;
mod collab;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod routes;
mod services;
mod websocket;

use axum::{routing::get, Router};
use std::panic;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use collab::SessionRegistry;
use config::Config;
use docs::ApiDoc;
use routes::create_api_routes;
use websocket::websocket_handler;

#[tokio::main]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "colab_forms=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    config::init_config(config);
    let config = config::get_config();

    // Warm the access cache used on the websocket join path
    services::form_service::init_form_access_cache();

    // Initialize database connection if URL is provided
    if let Some(db_url) = &config.db_url {
        match db::dbforms::init_db(db_url).await {
            Ok(_) => info!("Database initialized successfully"),
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                warn!("Form storage and access checks will not be available");
            }
        }
    } else {
        warn!("No database URL configured - forms are not persisted and every join is admitted");
    }

    // The registry every connection and handler shares
    let registry = Arc::new(SessionRegistry::new());

    // Create API routes
    let api_routes = create_api_routes(registry.clone());

    // CORS: configured origins, or wide open like the development default
    let cors = match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<axum::http::HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    // Combine all routes
    let app_routes = Router::new()
        // Mount API routes
        .nest("/api", api_routes)
        // Mount the websocket endpoint
        .route("/ws", get(websocket_handler).with_state(registry))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add CORS and tracing layers
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start the server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 Server running on http://{}", config.server_address());
    info!(
        "📡 WebSocket available at ws://{}/ws",
        config.server_address()
    );
    info!(
        "📚 Swagger UI available at http://{}/swagger",
        config.server_address()
    );

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
