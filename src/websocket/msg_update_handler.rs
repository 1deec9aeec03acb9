use tracing::debug;

use crate::collab::SessionRegistry;
use crate::models::FieldUpdateMessage;

/// Handle FieldUpdateMessage
pub async fn handle_update_message(
    registry: &SessionRegistry,
    update_msg: &FieldUpdateMessage,
    connection_id: &str,
) {
    debug!(
        "Update message received for form {}: field={}, user={}",
        update_msg.form_id, update_msg.field_id, update_msg.user_id
    );

    // Relay to everyone else in the session, nothing is stored
    match registry.publish_update(update_msg, connection_id) {
        Some(broadcast) => broadcast.deliver(),
        None => debug!(
            "Update for unknown form {} from connection {} dropped",
            update_msg.form_id, connection_id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JoinFormMessage, SendMessage};
    use serde_json::json;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn update_reaches_the_other_participant_only() {
        let registry = SessionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        for (user, connection, tx) in [("u-a", "c-a", &tx_a), ("u-b", "c-b", &tx_b)] {
            let join = JoinFormMessage {
                form_id: "f-1".to_string(),
                user_id: user.to_string(),
                username: user.to_string(),
            };
            registry.join(&join, connection, tx.clone()).deliver(tx);
        }
        rx_a.try_recv().ok();
        rx_a.try_recv().ok();
        rx_b.try_recv().ok();

        let update = FieldUpdateMessage {
            form_id: "f-1".to_string(),
            field_id: "email".to_string(),
            value: json!("hello"),
            user_id: "u-a".to_string(),
        };
        handle_update_message(&registry, &update, "c-a").await;

        match rx_b.try_recv() {
            Ok(SendMessage::FieldUpdated(msg)) => {
                assert_eq!(msg.field_id, "email");
                assert_eq!(msg.value, json!("hello"));
                assert_eq!(msg.updated_by, "u-a");
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(rx_a.try_recv().is_err());
    }
}
