use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::collab::SessionRegistry;
use crate::models::{JoinFormMessage, SendMessage};
use crate::services::form_service;

/// Handle JoinFormMessage
pub async fn handle_join_message(
    registry: &SessionRegistry,
    join_msg: &JoinFormMessage,
    connection_id: &str,
    tx: &mpsc::UnboundedSender<SendMessage>,
) {
    info!(
        "Join message received for form {}: user={}, connection={}",
        join_msg.form_id, join_msg.user_id, connection_id
    );

    // With persistence configured only creators and collaborators get
    // in; without it every join is admitted
    match form_service::can_access_form(&join_msg.form_id, &join_msg.user_id).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(
                "User {} denied access to form {}",
                join_msg.user_id, join_msg.form_id
            );
            return;
        }
        Err(e) => {
            error!(
                "Access check failed for form {}: {}",
                join_msg.form_id, e
            );
            return;
        }
    }

    registry.join(join_msg, connection_id, tx.clone()).deliver(tx);
}
