use std::collections::HashSet;

use tracing::debug;

use crate::collab::session::{Participant, Recipient, Session};
use crate::models::{
    ActiveUser, ActiveUsersMessage, SendMessage, UserJoinedMessage, UserLeftMessage,
};

/// Build the private `active-users` snapshot for a joining connection.
///
/// The list is deduplicated by user id, so a user editing in several tabs
/// appears once (their earliest connection wins), and it never includes
/// the joining connection itself.
pub fn snapshot(session: &Session, exclude_connection: &str) -> SendMessage {
    let mut entries: Vec<&Participant> = session
        .participants()
        .filter(|p| p.connection_id != exclude_connection)
        .collect();
    entries.sort_by(|a, b| {
        a.joined_at
            .cmp(&b.joined_at)
            .then_with(|| a.connection_id.cmp(&b.connection_id))
    });

    let mut seen = HashSet::new();
    let users = entries
        .into_iter()
        .filter(|p| seen.insert(p.user_id.clone()))
        .map(|p| ActiveUser {
            user_id: p.user_id.clone(),
            username: p.username.clone(),
            connection_id: p.connection_id.clone(),
        })
        .collect();

    SendMessage::ActiveUsers(ActiveUsersMessage { users })
}

pub fn user_joined(participant: &Participant) -> SendMessage {
    SendMessage::UserJoined(UserJoinedMessage {
        user_id: participant.user_id.clone(),
        username: participant.username.clone(),
    })
}

pub fn user_left(participant: &Participant) -> SendMessage {
    SendMessage::UserLeft(UserLeftMessage {
        user_id: participant.user_id.clone(),
        username: participant.username.clone(),
    })
}

/// Fire-and-forget fan-out. A closed receiver only means that connection
/// is already shutting down; delivery to everyone else proceeds.
pub fn deliver(recipients: &[Recipient], message: &SendMessage) {
    for recipient in recipients {
        if recipient.tx.send(message.clone()).is_err() {
            debug!(
                "Dropping message for closed connection {}",
                recipient.connection_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn joined(session: &mut Session, user_id: &str, connection_id: &str) {
        let (tx, _rx) = mpsc::unbounded_channel();
        session.insert(Participant::new(
            connection_id.to_string(),
            user_id.to_string(),
            format!("name-{}", user_id),
            tx,
        ));
    }

    fn snapshot_users(message: SendMessage) -> Vec<ActiveUser> {
        match message {
            SendMessage::ActiveUsers(msg) => msg.users,
            other => panic!("expected active-users, got {:?}", other),
        }
    }

    #[test]
    fn snapshot_excludes_the_joining_connection() {
        let mut session = Session::new("f-1".to_string());
        joined(&mut session, "u-1", "c-1");
        joined(&mut session, "u-2", "c-2");

        let users = snapshot_users(snapshot(&session, "c-2"));
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, "u-1");
    }

    #[test]
    fn snapshot_dedups_users_keeping_earliest_connection() {
        let mut session = Session::new("f-1".to_string());
        joined(&mut session, "u-1", "c-1");
        joined(&mut session, "u-1", "c-2");
        joined(&mut session, "u-2", "c-3");

        let users = snapshot_users(snapshot(&session, "c-9"));
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, "u-1");
        assert_eq!(users[0].connection_id, "c-1");
        assert_eq!(users[1].user_id, "u-2");
    }

    #[test]
    fn snapshot_of_empty_session_is_empty() {
        let session = Session::new("f-1".to_string());
        let users = snapshot_users(snapshot(&session, "c-1"));
        assert!(users.is_empty());
    }

    #[test]
    fn deliver_survives_closed_receivers() {
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        drop(closed_rx);
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();

        let recipients = vec![
            Recipient {
                connection_id: "c-1".to_string(),
                tx: closed_tx,
            },
            Recipient {
                connection_id: "c-2".to_string(),
                tx: live_tx,
            },
        ];

        let message = SendMessage::UserLeft(UserLeftMessage {
            user_id: "u-1".to_string(),
            username: "ada".to_string(),
        });
        deliver(&recipients, &message);

        assert!(matches!(
            live_rx.try_recv().unwrap(),
            SendMessage::UserLeft(_)
        ));
    }
}
