use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::collab::SessionRegistry;
use crate::config;
use crate::models::{ReceivedMessage, SendMessage};
use crate::services::auth_service::{auth_user_from_claims, get_auth_token, validate_jwt};
use crate::websocket::msg_join_handler::handle_join_message;
use crate::websocket::msg_lock_handler::handle_lock_message;
use crate::websocket::msg_unlock_handler::handle_unlock_message;
use crate::websocket::msg_update_handler::handle_update_message;

#[derive(Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    headers: HeaderMap,
    State(registry): State<Arc<SessionRegistry>>,
) -> Response {
    info!("New WebSocket connection attempt");

    // Validate the session token when a secret is configured. The
    // handshake carries it as a header, a cookie or a `token` query
    // parameter.
    let config = config::get_config();
    if let Some(secret) = &config.auth_jwt_secret {
        let token = match get_auth_token(&headers).ok().or(params.token) {
            Some(token) => token,
            None => {
                warn!("WebSocket connection rejected: no auth token");
                return StatusCode::UNAUTHORIZED.into_response();
            }
        };
        let token_data = match validate_jwt(&token, secret) {
            Ok(token_data) => token_data,
            Err(e) => {
                warn!("WebSocket connection rejected: {}", e);
                return StatusCode::UNAUTHORIZED.into_response();
            }
        };
        match auth_user_from_claims(&token_data.claims) {
            Ok(user) => debug!("WebSocket token validated for user {}", user.user_id),
            Err(e) => {
                warn!("WebSocket connection rejected: {}", e);
                return StatusCode::UNAUTHORIZED.into_response();
            }
        }
    } else {
        warn!("No auth JWT secret configured, accepting unauthenticated websocket");
    }

    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, registry: Arc<SessionRegistry>) {
    // Generate unique connection ID to identify this client
    let connection_id = Uuid::new_v4().to_string();
    info!(
        "WebSocket connection established with connection_id: {}",
        connection_id
    );

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Channel the collab core uses to reach this connection. The pump
    // task below owns the sink, so every outbound frame goes through
    // here.
    let (tx, mut rx) = mpsc::unbounded_channel::<SendMessage>();

    let ping_interval_secs = config::get_config().ws_ping_interval_secs;

    // Forward queued messages to the socket and keep the transport
    // alive with protocol pings
    let send_task = tokio::spawn(async move {
        let mut ping = tokio::time::interval(Duration::from_secs(ping_interval_secs));
        loop {
            tokio::select! {
                queued = rx.recv() => {
                    let Some(msg) = queued else { break };
                    let text = match serde_json::to_string(&msg) {
                        Ok(text) => text,
                        Err(e) => {
                            error!("Failed to serialize outbound message: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if sender.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read incoming frames until the client goes away
    while let Some(frame) = receiver.next().await {
        let msg = match frame {
            Ok(msg) => msg,
            Err(e) => {
                info!(
                    "WebSocket read error for connection {}: {}",
                    connection_id, e
                );
                break;
            }
        };
        match msg {
            Message::Text(text) => {
                // Parse the incoming message as JSON
                let received: ReceivedMessage = match serde_json::from_str(&text) {
                    Ok(received) => received,
                    Err(e) => {
                        error!(
                            "Failed to parse message from connection {}: {}",
                            connection_id, e
                        );
                        continue;
                    }
                };
                handle_message(&registry, received, &connection_id, &tx).await;
            }
            Message::Close(_) => break,
            // Pongs and any binary frames are ignored
            _ => {}
        }
    }

    // Release everything this connection held and tell the others
    for reap in registry.reap(&connection_id) {
        info!(
            "Connection {} reaped from form session {}",
            connection_id, reap.form_id
        );
        reap.deliver();
    }
    send_task.abort();
    info!(
        "WebSocket connection terminated for connection_id: {}",
        connection_id
    );
}

/// Route one parsed message to its handler
pub async fn handle_message(
    registry: &SessionRegistry,
    message: ReceivedMessage,
    connection_id: &str,
    tx: &mpsc::UnboundedSender<SendMessage>,
) {
    match message {
        ReceivedMessage::JoinForm(join_msg) => {
            handle_join_message(registry, &join_msg, connection_id, tx).await;
        }
        ReceivedMessage::FieldUpdate(update_msg) => {
            handle_update_message(registry, &update_msg, connection_id).await;
        }
        ReceivedMessage::FieldLock(lock_msg) => {
            handle_lock_message(registry, &lock_msg, connection_id).await;
        }
        ReceivedMessage::FieldUnlock(unlock_msg) => {
            handle_unlock_message(registry, &unlock_msg, connection_id).await;
        }
    }
}
