use chrono::Utc;

use crate::collab::locks::FieldLock;
use crate::models::{
    FieldLockedMessage, FieldUnlockedMessage, FieldUpdateMessage, FieldUpdatedMessage, SendMessage,
};

/// Stamp an incoming field edit for rebroadcast.
///
/// The relay never buffers or persists values. Whoever is connected at
/// this moment receives the event; late joiners start from whatever the
/// form API serves them.
pub fn field_updated(update: &FieldUpdateMessage) -> SendMessage {
    SendMessage::FieldUpdated(FieldUpdatedMessage {
        field_id: update.field_id.clone(),
        value: update.value.clone(),
        updated_by: update.user_id.clone(),
        timestamp: Utc::now(),
    })
}

/// Announce a lock grant. The timestamp is the acquisition time, so
/// catch-up copies sent to late joiners carry the original time.
pub fn field_locked(field_id: &str, lock: &FieldLock) -> SendMessage {
    SendMessage::FieldLocked(FieldLockedMessage {
        field_id: field_id.to_string(),
        locked_by: lock.user_id.clone(),
        username: lock.username.clone(),
        timestamp: lock.locked_at,
    })
}

pub fn field_unlocked(field_id: &str, unlocked_by: &str) -> SendMessage {
    SendMessage::FieldUnlocked(FieldUnlockedMessage {
        field_id: field_id.to_string(),
        unlocked_by: unlocked_by.to_string(),
        timestamp: Utc::now(),
    })
}
