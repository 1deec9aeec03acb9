use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinFormMessage {
    pub form_id: String,
    pub user_id: String,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdateMessage {
    pub form_id: String,
    pub field_id: String,
    pub value: serde_json::Value,
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FieldLockMessage {
    pub form_id: String,
    pub field_id: String,
    pub user_id: String,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FieldUnlockMessage {
    pub form_id: String,
    pub field_id: String,
    pub user_id: String,
}

/// Everything a client may send over the websocket.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ReceivedMessage {
    #[serde(rename = "join-form")]
    JoinForm(JoinFormMessage),
    #[serde(rename = "field-update")]
    FieldUpdate(FieldUpdateMessage),
    #[serde(rename = "field-lock")]
    FieldLock(FieldLockMessage),
    #[serde(rename = "field-unlock")]
    FieldUnlock(FieldUnlockMessage),
}

/// One participant entry in an `active-users` snapshot.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUser {
    pub user_id: String,
    pub username: String,
    pub connection_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUsersMessage {
    pub users: Vec<ActiveUser>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinedMessage {
    pub user_id: String,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftMessage {
    pub user_id: String,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdatedMessage {
    pub field_id: String,
    pub value: serde_json::Value,
    pub updated_by: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FieldLockedMessage {
    pub field_id: String,
    pub locked_by: String,
    pub username: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FieldUnlockedMessage {
    pub field_id: String,
    pub unlocked_by: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything the server may push to a client.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum SendMessage {
    #[serde(rename = "active-users")]
    ActiveUsers(ActiveUsersMessage),
    #[serde(rename = "user-joined")]
    UserJoined(UserJoinedMessage),
    #[serde(rename = "user-left")]
    UserLeft(UserLeftMessage),
    #[serde(rename = "field-updated")]
    FieldUpdated(FieldUpdatedMessage),
    #[serde(rename = "field-locked")]
    FieldLocked(FieldLockedMessage),
    #[serde(rename = "field-unlocked")]
    FieldUnlocked(FieldUnlockedMessage),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_join_form() {
        let raw = r#"{"type":"join-form","formId":"f-1","userId":"u-1","username":"ada"}"#;
        let msg: ReceivedMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ReceivedMessage::JoinForm(join) => {
                assert_eq!(join.form_id, "f-1");
                assert_eq!(join.user_id, "u-1");
                assert_eq!(join.username, "ada");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn parses_field_update_with_arbitrary_value() {
        let raw = r#"{"type":"field-update","formId":"f-1","fieldId":"email","value":{"lines":[1,2]},"userId":"u-1"}"#;
        let msg: ReceivedMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ReceivedMessage::FieldUpdate(update) => {
                assert_eq!(update.field_id, "email");
                assert_eq!(update.value, json!({"lines": [1, 2]}));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn parses_lock_and_unlock() {
        let lock = r#"{"type":"field-lock","formId":"f-1","fieldId":"email","userId":"u-1","username":"ada"}"#;
        assert!(matches!(
            serde_json::from_str::<ReceivedMessage>(lock).unwrap(),
            ReceivedMessage::FieldLock(_)
        ));

        let unlock = r#"{"type":"field-unlock","formId":"f-1","fieldId":"email","userId":"u-1"}"#;
        assert!(matches!(
            serde_json::from_str::<ReceivedMessage>(unlock).unwrap(),
            ReceivedMessage::FieldUnlock(_)
        ));
    }

    #[test]
    fn rejects_unknown_type_tag() {
        let raw = r#"{"type":"shutdown-server","formId":"f-1"}"#;
        assert!(serde_json::from_str::<ReceivedMessage>(raw).is_err());
    }

    #[test]
    fn serializes_field_locked_with_camel_case_keys() {
        let msg = SendMessage::FieldLocked(FieldLockedMessage {
            field_id: "email".to_string(),
            locked_by: "u-1".to_string(),
            username: "ada".to_string(),
            timestamp: Utc::now(),
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "field-locked");
        assert_eq!(value["fieldId"], "email");
        assert_eq!(value["lockedBy"], "u-1");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn serializes_active_users_under_users_key() {
        let msg = SendMessage::ActiveUsers(ActiveUsersMessage {
            users: vec![ActiveUser {
                user_id: "u-1".to_string(),
                username: "ada".to_string(),
                connection_id: "c-1".to_string(),
            }],
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "active-users");
        assert_eq!(value["users"][0]["connectionId"], "c-1");
    }

    #[test]
    fn serializes_field_updated_and_unlocked() {
        let updated = SendMessage::FieldUpdated(FieldUpdatedMessage {
            field_id: "notes".to_string(),
            value: json!("draft text"),
            updated_by: "u-2".to_string(),
            timestamp: Utc::now(),
        });
        let value = serde_json::to_value(&updated).unwrap();
        assert_eq!(value["type"], "field-updated");
        assert_eq!(value["updatedBy"], "u-2");

        let unlocked = SendMessage::FieldUnlocked(FieldUnlockedMessage {
            field_id: "notes".to_string(),
            unlocked_by: "u-2".to_string(),
            timestamp: Utc::now(),
        });
        let value = serde_json::to_value(&unlocked).unwrap();
        assert_eq!(value["type"], "field-unlocked");
        assert_eq!(value["unlockedBy"], "u-2");
    }
}
