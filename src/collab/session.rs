use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::mpsc;

use crate::collab::locks::{FieldLock, LockTable};
use crate::models::SendMessage;

/// State for a single joined websocket connection.
#[derive(Clone)]
pub struct Participant {
    pub connection_id: String,
    pub user_id: String,
    pub username: String,
    pub joined_at: DateTime<Utc>,
    pub tx: mpsc::UnboundedSender<SendMessage>,
}

impl Participant {
    pub fn new(
        connection_id: String,
        user_id: String,
        username: String,
        tx: mpsc::UnboundedSender<SendMessage>,
    ) -> Self {
        Self {
            connection_id,
            user_id,
            username,
            joined_at: Utc::now(),
            tx,
        }
    }
}

/// Delivery handle snapshotted from a session while its guard was held.
/// The actual sends happen after the guard is released.
#[derive(Clone)]
pub struct Recipient {
    pub connection_id: String,
    pub tx: mpsc::UnboundedSender<SendMessage>,
}

/// Live editing state for one form. A session exists only while at least
/// one connection is joined; the registry drops it once the last one
/// leaves.
pub struct Session {
    pub form_id: String,
    participants: HashMap<String, Participant>,
    locks: LockTable,
}

impl Session {
    pub fn new(form_id: String) -> Self {
        Self {
            form_id,
            participants: HashMap::new(),
            locks: LockTable::new(),
        }
    }

    /// Register a connection, replacing any previous entry for the same
    /// connection id. Returns true when this is the user's first
    /// connection in the session.
    pub fn insert(&mut self, participant: Participant) -> bool {
        let first_for_user = !self.has_user(&participant.user_id);
        self.participants
            .insert(participant.connection_id.clone(), participant);
        first_for_user
    }

    /// Remove a connection. Returns the participant together with a flag
    /// that is true when no other connection of the same user remains.
    pub fn remove(&mut self, connection_id: &str) -> Option<(Participant, bool)> {
        let participant = self.participants.remove(connection_id)?;
        let last_for_user = !self.has_user(&participant.user_id);
        Some((participant, last_for_user))
    }

    pub fn has_user(&self, user_id: &str) -> bool {
        self.participants.values().any(|p| p.user_id == user_id)
    }

    pub fn contains_connection(&self, connection_id: &str) -> bool {
        self.participants.contains_key(connection_id)
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Distinct users, counting a user with several tabs once.
    pub fn user_count(&self) -> usize {
        let users: std::collections::HashSet<&str> = self
            .participants
            .values()
            .map(|p| p.user_id.as_str())
            .collect();
        users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Senders for every participant except the given connection.
    pub fn recipients_except(&self, connection_id: &str) -> Vec<Recipient> {
        self.participants
            .values()
            .filter(|p| p.connection_id != connection_id)
            .map(|p| Recipient {
                connection_id: p.connection_id.clone(),
                tx: p.tx.clone(),
            })
            .collect()
    }

    pub fn lock_field(
        &mut self,
        field_id: &str,
        user_id: &str,
        username: &str,
        connection_id: &str,
    ) -> FieldLock {
        self.locks.acquire(field_id, user_id, username, connection_id)
    }

    pub fn unlock_field(&mut self, field_id: &str) -> Option<FieldLock> {
        self.locks.release(field_id)
    }

    pub fn release_locks_for(&mut self, connection_id: &str) -> Vec<(String, FieldLock)> {
        self.locks.release_all_for_connection(connection_id)
    }

    pub fn locks(&self) -> &LockTable {
        &self.locks
    }
}
