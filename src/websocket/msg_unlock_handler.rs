use tracing::{debug, info};

use crate::collab::SessionRegistry;
use crate::models::FieldUnlockMessage;

/// Handle FieldUnlockMessage
pub async fn handle_unlock_message(
    registry: &SessionRegistry,
    unlock_msg: &FieldUnlockMessage,
    connection_id: &str,
) {
    info!(
        "Unlock message received for form {}: field={}, user={}",
        unlock_msg.form_id, unlock_msg.field_id, unlock_msg.user_id
    );

    // Relayed even when nothing was locked, so clients clear any
    // indicator they still show for the field
    match registry.release_lock(unlock_msg, connection_id) {
        Some(broadcast) => broadcast.deliver(),
        None => debug!(
            "Unlock for unknown form {} from connection {} dropped",
            unlock_msg.form_id, connection_id
        ),
    }
}
