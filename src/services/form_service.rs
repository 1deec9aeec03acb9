use moka::sync::Cache;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::dbforms;

static FORM_ACCESS_CACHE: OnceLock<Cache<String, bool>> = OnceLock::new();

pub fn init_form_access_cache() {
    get_form_access_cache();
    info!("Form access cache initialized");
}

fn get_form_access_cache() -> &'static Cache<String, bool> {
    FORM_ACCESS_CACHE.get_or_init(|| {
        Cache::builder()
            .max_capacity(100_000)
            .time_to_idle(Duration::from_secs(60))
            .build()
    })
}

/// Generate a share code users can read out loud
pub fn generate_share_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(|c| char::from(c).to_ascii_uppercase())
        .take(8)
        .collect()
}

/// Generate a share code not yet present in the database. Gives up after
/// ten attempts rather than looping forever.
pub async fn unique_share_code(db: &dbforms::DbForms) -> Result<String, String> {
    for _ in 0..10 {
        let code = generate_share_code();
        match db.share_code_exists(&code).await {
            Ok(false) => return Ok(code),
            Ok(true) => continue,
            Err(e) => return Err(format!("Share code lookup failed: {}", e)),
        }
    }
    Err("Could not generate unique share code after 10 attempts".to_string())
}

/// Check whether a user may enter the editing session of a form.
///
/// Without a database configured every join is allowed and the realtime
/// relay runs in open mode. Decisions are cached briefly per form and
/// user; a user added as collaborator is admitted on the next check once
/// their stale entry idles out.
pub async fn can_access_form(form_id: &str, user_id: &str) -> Result<bool, String> {
    let Some(db) = dbforms::get_db() else {
        return Ok(true);
    };

    let (Ok(form_uuid), Ok(user_uuid)) = (Uuid::parse_str(form_id), Uuid::parse_str(user_id))
    else {
        warn!(
            "Malformed form or user id in access check: {} / {}",
            form_id, user_id
        );
        return Ok(false);
    };

    let cache = get_form_access_cache();
    let key = format!("{}/{}", form_id, user_id);
    if let Some(allowed) = cache.get(&key) {
        return Ok(allowed);
    }

    let allowed = db
        .has_form_access(form_uuid, user_uuid)
        .await
        .map_err(|e| format!("Access lookup failed: {}", e))?;
    cache.insert(key, allowed);
    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_codes_are_eight_uppercase_alphanumerics() {
        for _ in 0..32 {
            let code = generate_share_code();
            assert_eq!(code.len(), 8);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn share_codes_do_not_repeat_in_practice() {
        let codes: std::collections::HashSet<String> =
            (0..100).map(|_| generate_share_code()).collect();
        assert_eq!(codes.len(), 100);
    }

    #[tokio::test]
    async fn access_is_open_without_a_database() {
        let allowed = can_access_form("any-form", "any-user").await.unwrap();
        assert!(allowed);
    }
}
