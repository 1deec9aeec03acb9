use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A soft lock on a single form field.
#[derive(Clone, Debug)]
pub struct FieldLock {
    pub user_id: String,
    pub username: String,
    pub connection_id: String,
    pub locked_at: DateTime<Utc>,
}

/// Lock table for one session. Locks signal editing intent, they never
/// block: a request for an already-locked field reassigns it to the new
/// requester.
#[derive(Default)]
pub struct LockTable {
    locks: HashMap<String, FieldLock>,
}

impl LockTable {
    pub fn new() -> Self {
        Self {
            locks: HashMap::new(),
        }
    }

    /// Record `field_id` as held by the given participant, displacing any
    /// previous holder.
    pub fn acquire(
        &mut self,
        field_id: &str,
        user_id: &str,
        username: &str,
        connection_id: &str,
    ) -> FieldLock {
        let lock = FieldLock {
            user_id: user_id.to_string(),
            username: username.to_string(),
            connection_id: connection_id.to_string(),
            locked_at: Utc::now(),
        };
        self.locks.insert(field_id.to_string(), lock.clone());
        lock
    }

    /// Drop the lock on `field_id`. Releasing an unheld field is not an
    /// error and returns `None`.
    pub fn release(&mut self, field_id: &str) -> Option<FieldLock> {
        self.locks.remove(field_id)
    }

    /// Drop every lock held by `connection_id`, returning the released
    /// pairs ordered by field id.
    pub fn release_all_for_connection(&mut self, connection_id: &str) -> Vec<(String, FieldLock)> {
        let mut fields: Vec<String> = self
            .locks
            .iter()
            .filter(|(_, lock)| lock.connection_id == connection_id)
            .map(|(field_id, _)| field_id.clone())
            .collect();
        fields.sort();
        fields
            .into_iter()
            .filter_map(|field_id| self.locks.remove(&field_id).map(|lock| (field_id, lock)))
            .collect()
    }

    pub fn holder(&self, field_id: &str) -> Option<&FieldLock> {
        self.locks.get(field_id)
    }

    /// Current locks ordered by field id.
    pub fn snapshot(&self) -> Vec<(String, FieldLock)> {
        let mut entries: Vec<(String, FieldLock)> = self
            .locks
            .iter()
            .map(|(field_id, lock)| (field_id.clone(), lock.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
