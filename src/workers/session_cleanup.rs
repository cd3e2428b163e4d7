use crate::store::Store;

pub async fn run(store: &Store) {
    tracing::debug!("session_cleanup: start");
    match store.cleanup_expired_admin_sessions() {
        Ok(count) => tracing::info!(cleaned = count, "session_cleanup: done"),
        Err(e) => tracing::error!(error = %e, "session_cleanup failed"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::store::operations::sessions::SessionRecord;

    #[tokio::test]
    async fn removes_only_expired_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("cleanup.sled").to_str().unwrap()).unwrap();
        let now = Utc::now();
        for (hash, expires_at) in [("old", now - Duration::hours(1)), ("live", now + Duration::hours(1))] {
            store
                .create_admin_session(&SessionRecord {
                    token_hash: hash.to_string(),
                    admin_id: "a1".to_string(),
                    created_at: now - Duration::hours(2),
                    expires_at,
                    revoked: false,
                })
                .unwrap();
        }

        run(&store).await;

        assert!(store.admin_sessions.get("old").unwrap().is_none());
        assert!(store.get_admin_session("live").unwrap().is_some());
    }
}
