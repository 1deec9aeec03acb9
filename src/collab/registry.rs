use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::collab::presence;
use crate::collab::relay;
use crate::collab::session::{Participant, Recipient, Session};
use crate::models::{
    ActiveUser, FieldLockMessage, FieldUnlockMessage, FieldUpdateMessage, JoinFormMessage,
    SendMessage,
};

/// A message paired with the recipients it should reach. Recipient lists
/// are snapshotted while the session guard is held; sending happens after
/// the guard is released.
pub struct Broadcast {
    pub message: SendMessage,
    pub recipients: Vec<Recipient>,
}

impl Broadcast {
    pub fn deliver(&self) {
        presence::deliver(&self.recipients, &self.message);
    }
}

/// Result of joining a session: private catch-up for the joiner plus the
/// announcement for everyone already there.
pub struct JoinOutcome {
    pub snapshot: SendMessage,
    pub lock_state: Vec<SendMessage>,
    pub joined: Option<Broadcast>,
}

impl JoinOutcome {
    /// Send the private catch-up to the joiner, then announce the join.
    pub fn deliver(&self, joiner: &mpsc::UnboundedSender<SendMessage>) {
        let _ = joiner.send(self.snapshot.clone());
        for message in &self.lock_state {
            let _ = joiner.send(message.clone());
        }
        if let Some(joined) = &self.joined {
            joined.deliver();
        }
    }
}

/// Cleanup performed in one session for a connection that went away.
pub struct SessionReap {
    pub form_id: String,
    pub recipients: Vec<Recipient>,
    pub unlocked: Vec<SendMessage>,
    pub left: Option<SendMessage>,
}

impl SessionReap {
    /// Locks are announced as released before the user is announced gone.
    pub fn deliver(&self) {
        for message in &self.unlocked {
            presence::deliver(&self.recipients, message);
        }
        if let Some(left) = &self.left {
            presence::deliver(&self.recipients, left);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub sessions: usize,
    pub connections: usize,
    pub participants: usize,
    pub locks: usize,
}

/// All live form sessions, keyed by form id.
///
/// Sessions are created implicitly by the first join and removed when the
/// last participant leaves. All mutation for one session happens under a
/// single map entry guard, so a join and a reap on the same form cannot
/// interleave halfway.
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Join a connection to a form session, creating the session if
    /// needed. `user-joined` is only announced for a user's first
    /// connection; further tabs of the same user join silently.
    pub fn join(
        &self,
        join: &JoinFormMessage,
        connection_id: &str,
        tx: mpsc::UnboundedSender<SendMessage>,
    ) -> JoinOutcome {
        let mut entry = self
            .sessions
            .entry(join.form_id.clone())
            .or_insert_with(|| Session::new(join.form_id.clone()));
        let session = entry.value_mut();

        let recipients = session.recipients_except(connection_id);
        let snapshot = presence::snapshot(session, connection_id);
        let lock_state = session
            .locks()
            .snapshot()
            .iter()
            .map(|(field_id, lock)| relay::field_locked(field_id, lock))
            .collect();

        let participant = Participant::new(
            connection_id.to_string(),
            join.user_id.clone(),
            join.username.clone(),
            tx,
        );
        let announce = presence::user_joined(&participant);
        let first_for_user = session.insert(participant);
        drop(entry);

        JoinOutcome {
            snapshot,
            lock_state,
            joined: first_for_user.then_some(Broadcast {
                message: announce,
                recipients,
            }),
        }
    }

    /// Grant a field lock to the requesting participant, displacing any
    /// current holder. Requests from connections that never joined the
    /// session are dropped, which keeps every lock owned by a live
    /// participant.
    pub fn acquire_lock(&self, lock: &FieldLockMessage, connection_id: &str) -> Option<Broadcast> {
        let mut entry = self.sessions.get_mut(&lock.form_id)?;
        let session = entry.value_mut();
        if !session.contains_connection(connection_id) {
            debug!(
                "Ignoring lock request for form {} from connection {} outside the session",
                lock.form_id, connection_id
            );
            return None;
        }

        let granted = session.lock_field(&lock.field_id, &lock.user_id, &lock.username, connection_id);
        let message = relay::field_locked(&lock.field_id, &granted);
        let recipients = session.recipients_except(connection_id);
        drop(entry);

        Some(Broadcast {
            message,
            recipients,
        })
    }

    /// Release a field lock. Unlocking an unheld field still relays the
    /// event so clients can clear stale indicators.
    pub fn release_lock(
        &self,
        unlock: &FieldUnlockMessage,
        connection_id: &str,
    ) -> Option<Broadcast> {
        let mut entry = self.sessions.get_mut(&unlock.form_id)?;
        let session = entry.value_mut();
        session.unlock_field(&unlock.field_id);
        let message = relay::field_unlocked(&unlock.field_id, &unlock.user_id);
        let recipients = session.recipients_except(connection_id);
        drop(entry);

        Some(Broadcast {
            message,
            recipients,
        })
    }

    /// Relay a field edit to everyone else in the session. If the session
    /// does not exist the event is dropped.
    pub fn publish_update(
        &self,
        update: &FieldUpdateMessage,
        connection_id: &str,
    ) -> Option<Broadcast> {
        let entry = self.sessions.get(&update.form_id)?;
        let message = relay::field_updated(update);
        let recipients = entry.recipients_except(connection_id);
        drop(entry);

        Some(Broadcast {
            message,
            recipients,
        })
    }

    /// Raw per-connection participant list for one session. A user with
    /// several tabs appears once per connection here.
    pub fn participants(&self, form_id: &str) -> Vec<ActiveUser> {
        let Some(entry) = self.sessions.get(form_id) else {
            return Vec::new();
        };
        let mut users: Vec<ActiveUser> = entry
            .participants()
            .map(|p| ActiveUser {
                user_id: p.user_id.clone(),
                username: p.username.clone(),
                connection_id: p.connection_id.clone(),
            })
            .collect();
        users.sort_by(|a, b| a.connection_id.cmp(&b.connection_id));
        users
    }

    /// Release everything a disconnected connection owned: its locks
    /// first, then its presence, session by session. Sessions left with
    /// no participants are removed. A reconnect arrives as a brand-new
    /// connection id, so it never races with its own reap.
    pub fn reap(&self, connection_id: &str) -> Vec<SessionReap> {
        let form_ids: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.contains_connection(connection_id))
            .map(|entry| entry.key().clone())
            .collect();

        let mut reaps = Vec::new();
        for form_id in form_ids {
            if let Some(reap) = self.reap_session(&form_id, connection_id) {
                reaps.push(reap);
            }
            self.sessions
                .remove_if(&form_id, |_, session| session.is_empty());
        }
        reaps
    }

    fn reap_session(&self, form_id: &str, connection_id: &str) -> Option<SessionReap> {
        let mut entry = self.sessions.get_mut(form_id)?;
        let session = entry.value_mut();

        let unlocked: Vec<SendMessage> = session
            .release_locks_for(connection_id)
            .iter()
            .map(|(field_id, lock)| relay::field_unlocked(field_id, &lock.user_id))
            .collect();
        let removed = session.remove(connection_id);
        let recipients = session.recipients_except(connection_id);
        let left = match removed {
            Some((participant, true)) => Some(presence::user_left(&participant)),
            _ => None,
        };
        drop(entry);

        Some(SessionReap {
            form_id: form_id.to_string(),
            recipients,
            unlocked,
            left,
        })
    }

    /// Drop a session outright, e.g. after its form was deleted. Joined
    /// connections stay open; their later events for this form are
    /// dropped as unknown and their eventual reap finds nothing.
    pub fn close_session(&self, form_id: &str) -> bool {
        self.sessions.remove(form_id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            sessions: 0,
            connections: 0,
            participants: 0,
            locks: 0,
        };
        for entry in self.sessions.iter() {
            stats.sessions += 1;
            stats.connections += entry.participant_count();
            stats.participants += entry.user_count();
            stats.locks += entry.locks().len();
        }
        stats
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    struct TestClient {
        connection_id: String,
        rx: mpsc::UnboundedReceiver<SendMessage>,
    }

    impl TestClient {
        fn drain(&mut self) -> Vec<SendMessage> {
            let mut out = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                out.push(msg);
            }
            out
        }
    }

    fn join_form(
        registry: &SessionRegistry,
        form_id: &str,
        user_id: &str,
        connection_id: &str,
    ) -> TestClient {
        let (tx, rx) = mpsc::unbounded_channel();
        let join = JoinFormMessage {
            form_id: form_id.to_string(),
            user_id: user_id.to_string(),
            username: format!("name-{}", user_id),
        };
        registry.join(&join, connection_id, tx.clone()).deliver(&tx);
        TestClient {
            connection_id: connection_id.to_string(),
            rx,
        }
    }

    fn lock_field(registry: &SessionRegistry, form_id: &str, field_id: &str, client: &TestClient, user_id: &str) {
        let lock = FieldLockMessage {
            form_id: form_id.to_string(),
            field_id: field_id.to_string(),
            user_id: user_id.to_string(),
            username: format!("name-{}", user_id),
        };
        if let Some(broadcast) = registry.acquire_lock(&lock, &client.connection_id) {
            broadcast.deliver();
        }
    }

    #[test]
    fn first_join_creates_session_with_empty_snapshot() {
        let registry = SessionRegistry::new();
        let mut a = join_form(&registry, "f-1", "u-a", "c-a");

        let messages = a.drain();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            SendMessage::ActiveUsers(msg) => assert!(msg.users.is_empty()),
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(registry.session_count(), 1);
    }

    #[test]
    fn joiner_receives_snapshot_and_existing_locks() {
        let registry = SessionRegistry::new();
        let mut a = join_form(&registry, "f-1", "u-a", "c-a");
        lock_field(&registry, "f-1", "email", &a, "u-a");
        a.drain();

        let mut b = join_form(&registry, "f-1", "u-b", "c-b");
        let messages = b.drain();
        assert_eq!(messages.len(), 2);
        match &messages[0] {
            SendMessage::ActiveUsers(msg) => {
                assert_eq!(msg.users.len(), 1);
                assert_eq!(msg.users[0].user_id, "u-a");
            }
            other => panic!("unexpected message: {:?}", other),
        }
        match &messages[1] {
            SendMessage::FieldLocked(msg) => {
                assert_eq!(msg.field_id, "email");
                assert_eq!(msg.locked_by, "u-a");
            }
            other => panic!("unexpected message: {:?}", other),
        }

        // The earlier participant only hears about the join.
        let messages = a.drain();
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], SendMessage::UserJoined(msg) if msg.user_id == "u-b"));
    }

    #[test]
    fn second_connection_of_same_user_joins_silently() {
        let registry = SessionRegistry::new();
        let mut a1 = join_form(&registry, "f-1", "u-a", "c-1");
        a1.drain();

        let mut a2 = join_form(&registry, "f-1", "u-a", "c-2");

        // No duplicate presence announcement for the first tab.
        assert!(a1.drain().is_empty());
        // The new tab still sees the user's earlier connection.
        let messages = a2.drain();
        match &messages[0] {
            SendMessage::ActiveUsers(msg) => {
                assert_eq!(msg.users.len(), 1);
                assert_eq!(msg.users[0].connection_id, "c-1");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn update_reaches_everyone_but_the_sender() {
        let registry = SessionRegistry::new();
        let mut a = join_form(&registry, "f-1", "u-a", "c-a");
        let mut b = join_form(&registry, "f-1", "u-b", "c-b");
        let mut c = join_form(&registry, "f-1", "u-c", "c-c");
        a.drain();
        b.drain();
        c.drain();

        let update = FieldUpdateMessage {
            form_id: "f-1".to_string(),
            field_id: "name".to_string(),
            value: json!("Grace"),
            user_id: "u-b".to_string(),
        };
        registry
            .publish_update(&update, &b.connection_id)
            .unwrap()
            .deliver();

        for client in [&mut a, &mut c] {
            let messages = client.drain();
            assert_eq!(messages.len(), 1);
            match &messages[0] {
                SendMessage::FieldUpdated(msg) => {
                    assert_eq!(msg.field_id, "name");
                    assert_eq!(msg.value, json!("Grace"));
                    assert_eq!(msg.updated_by, "u-b");
                }
                other => panic!("unexpected message: {:?}", other),
            }
        }
        assert!(b.drain().is_empty());
    }

    #[test]
    fn update_for_unknown_form_is_dropped() {
        let registry = SessionRegistry::new();
        let update = FieldUpdateMessage {
            form_id: "missing".to_string(),
            field_id: "name".to_string(),
            value: json!(1),
            user_id: "u-a".to_string(),
        };
        assert!(registry.publish_update(&update, "c-a").is_none());
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn lock_request_reassigns_and_notifies_previous_holder() {
        let registry = SessionRegistry::new();
        let mut a = join_form(&registry, "f-1", "u-a", "c-a");
        let b = join_form(&registry, "f-1", "u-b", "c-b");
        a.drain();

        lock_field(&registry, "f-1", "email", &a, "u-a");
        a.drain();
        lock_field(&registry, "f-1", "email", &b, "u-b");

        let messages = a.drain();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            SendMessage::FieldLocked(msg) => {
                assert_eq!(msg.field_id, "email");
                assert_eq!(msg.locked_by, "u-b");
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(registry.stats().locks, 1);
    }

    #[test]
    fn lock_from_connection_outside_session_is_dropped() {
        let registry = SessionRegistry::new();
        let _a = join_form(&registry, "f-1", "u-a", "c-a");

        let lock = FieldLockMessage {
            form_id: "f-1".to_string(),
            field_id: "email".to_string(),
            user_id: "u-x".to_string(),
            username: "mallory".to_string(),
        };
        assert!(registry.acquire_lock(&lock, "c-never-joined").is_none());
        assert_eq!(registry.stats().locks, 0);
    }

    #[test]
    fn unlock_of_unheld_field_still_relays() {
        let registry = SessionRegistry::new();
        let a = join_form(&registry, "f-1", "u-a", "c-a");
        let mut b = join_form(&registry, "f-1", "u-b", "c-b");
        b.drain();

        let unlock = FieldUnlockMessage {
            form_id: "f-1".to_string(),
            field_id: "never-locked".to_string(),
            user_id: "u-a".to_string(),
        };
        registry
            .release_lock(&unlock, &a.connection_id)
            .unwrap()
            .deliver();

        let messages = b.drain();
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            &messages[0],
            SendMessage::FieldUnlocked(msg) if msg.field_id == "never-locked" && msg.unlocked_by == "u-a"
        ));
    }

    #[test]
    fn reap_releases_locks_before_presence() {
        let registry = SessionRegistry::new();
        let a = join_form(&registry, "f-1", "u-a", "c-a");
        let mut b = join_form(&registry, "f-1", "u-b", "c-b");
        lock_field(&registry, "f-1", "email", &a, "u-a");
        lock_field(&registry, "f-1", "name", &a, "u-a");
        b.drain();

        for reap in registry.reap(&a.connection_id) {
            reap.deliver();
        }

        let messages = b.drain();
        assert_eq!(messages.len(), 3);
        assert!(matches!(&messages[0], SendMessage::FieldUnlocked(msg) if msg.field_id == "email"));
        assert!(matches!(&messages[1], SendMessage::FieldUnlocked(msg) if msg.field_id == "name"));
        assert!(matches!(&messages[2], SendMessage::UserLeft(msg) if msg.user_id == "u-a"));

        let stats = registry.stats();
        assert_eq!(stats.participants, 1);
        assert_eq!(stats.locks, 0);
    }

    #[test]
    fn reap_of_last_participant_removes_the_session() {
        let registry = SessionRegistry::new();
        let a = join_form(&registry, "f-1", "u-a", "c-a");
        lock_field(&registry, "f-1", "email", &a, "u-a");

        let reaps = registry.reap(&a.connection_id);
        assert_eq!(reaps.len(), 1);
        assert!(reaps[0].recipients.is_empty());
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn reap_of_one_tab_keeps_the_user_present() {
        let registry = SessionRegistry::new();
        let mut a1 = join_form(&registry, "f-1", "u-a", "c-1");
        let a2 = join_form(&registry, "f-1", "u-a", "c-2");
        lock_field(&registry, "f-1", "email", &a2, "u-a");
        a1.drain();

        for reap in registry.reap(&a2.connection_id) {
            reap.deliver();
        }

        // The lock is released but the user never "leaves".
        let messages = a1.drain();
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], SendMessage::FieldUnlocked(_)));
        assert_eq!(registry.stats().participants, 1);
        assert_eq!(registry.session_count(), 1);
    }

    #[test]
    fn reap_covers_every_session_of_the_connection() {
        let registry = SessionRegistry::new();
        let _a1 = join_form(&registry, "f-1", "u-a", "c-a");
        let _a2 = join_form(&registry, "f-2", "u-a", "c-a");
        let _b = join_form(&registry, "f-2", "u-b", "c-b");

        let mut reaps = registry.reap("c-a");
        reaps.sort_by(|x, y| x.form_id.cmp(&y.form_id));
        assert_eq!(reaps.len(), 2);
        assert_eq!(reaps[0].form_id, "f-1");
        assert_eq!(reaps[1].form_id, "f-2");
        assert_eq!(registry.session_count(), 1);
    }

    #[test]
    fn closed_session_drops_later_events_and_reaps() {
        let registry = SessionRegistry::new();
        let a = join_form(&registry, "f-1", "u-a", "c-a");
        lock_field(&registry, "f-1", "email", &a, "u-a");

        assert!(registry.close_session("f-1"));
        assert!(!registry.close_session("f-1"));
        assert_eq!(registry.session_count(), 0);

        let update = FieldUpdateMessage {
            form_id: "f-1".to_string(),
            field_id: "email".to_string(),
            value: json!("x"),
            user_id: "u-a".to_string(),
        };
        assert!(registry.publish_update(&update, &a.connection_id).is_none());
        assert!(registry.reap(&a.connection_id).is_empty());
    }

    #[test]
    fn rejoin_after_reap_starts_clean() {
        let registry = SessionRegistry::new();
        let a = join_form(&registry, "f-1", "u-a", "c-1");
        lock_field(&registry, "f-1", "email", &a, "u-a");
        registry.reap(&a.connection_id);

        let mut again = join_form(&registry, "f-1", "u-a", "c-2");
        let messages = again.drain();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            SendMessage::ActiveUsers(msg) => assert!(msg.users.is_empty()),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn participants_lists_every_connection() {
        let registry = SessionRegistry::new();
        let _a1 = join_form(&registry, "f-1", "u-a", "c-1");
        let _a2 = join_form(&registry, "f-1", "u-a", "c-2");
        let _b = join_form(&registry, "f-1", "u-b", "c-3");

        let listed = registry.participants("f-1");
        assert_eq!(listed.len(), 3);
        let connections: Vec<&str> = listed.iter().map(|u| u.connection_id.as_str()).collect();
        assert_eq!(connections, vec!["c-1", "c-2", "c-3"]);

        let stats = registry.stats();
        assert_eq!(stats.connections, 3);
        assert_eq!(stats.participants, 2);

        assert!(registry.participants("missing").is_empty());
    }

    #[test]
    fn abrupt_disconnect_scenario_end_to_end() {
        let registry = SessionRegistry::new();
        let a = join_form(&registry, "f-1", "u-a", "c-a");
        let mut b = join_form(&registry, "f-1", "u-b", "c-b");
        lock_field(&registry, "f-1", "email", &a, "u-a");

        // A third user joins late and catches up on presence and locks.
        let mut c = join_form(&registry, "f-1", "u-c", "c-c");
        let catch_up = c.drain();
        assert_eq!(catch_up.len(), 2);
        match &catch_up[0] {
            SendMessage::ActiveUsers(msg) => {
                let mut ids: Vec<&str> = msg.users.iter().map(|u| u.user_id.as_str()).collect();
                ids.sort();
                assert_eq!(ids, vec!["u-a", "u-b"]);
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(matches!(&catch_up[1], SendMessage::FieldLocked(msg) if msg.locked_by == "u-a"));

        // A's socket dies without any unlock or goodbye.
        b.drain();
        for reap in registry.reap(&a.connection_id) {
            reap.deliver();
        }

        for survivor in [&mut b, &mut c] {
            let messages = survivor.drain();
            assert_eq!(messages.len(), 2);
            assert!(
                matches!(&messages[0], SendMessage::FieldUnlocked(msg) if msg.field_id == "email" && msg.unlocked_by == "u-a")
            );
            assert!(matches!(&messages[1], SendMessage::UserLeft(msg) if msg.user_id == "u-a"));
        }

        let stats = registry.stats();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.participants, 2);
        assert_eq!(stats.locks, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_churn_leaves_no_residue() {
        let registry = Arc::new(SessionRegistry::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let user_id = format!("u-{}", i % 4);
                let connection_id = format!("c-{}", i);
                for round in 0..25 {
                    let client = join_form(&registry, "f-busy", &user_id, &connection_id);
                    lock_field(
                        &registry,
                        "f-busy",
                        &format!("field-{}", round % 3),
                        &client,
                        &user_id,
                    );
                    for reap in registry.reap(&connection_id) {
                        reap.deliver();
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = registry.stats();
        assert_eq!(stats.sessions, 0);
        assert_eq!(stats.connections, 0);
        assert_eq!(stats.participants, 0);
        assert_eq!(stats.locks, 0);
    }
}
