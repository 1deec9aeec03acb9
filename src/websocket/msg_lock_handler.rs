use tracing::{debug, info};

use crate::collab::SessionRegistry;
use crate::models::FieldLockMessage;

/// Handle FieldLockMessage
pub async fn handle_lock_message(
    registry: &SessionRegistry,
    lock_msg: &FieldLockMessage,
    connection_id: &str,
) {
    info!(
        "Lock message received for form {}: field={}, user={}",
        lock_msg.form_id, lock_msg.field_id, lock_msg.user_id
    );

    // A lock request always succeeds, displacing any previous holder
    match registry.acquire_lock(lock_msg, connection_id) {
        Some(broadcast) => broadcast.deliver(),
        None => debug!(
            "Lock request from connection {} outside form {} dropped",
            connection_id, lock_msg.form_id
        ),
    }
}
