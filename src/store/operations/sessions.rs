use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{keys, tx_error};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub token_hash: String,
    pub admin_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl Store {
    pub fn create_admin_session(&self, session: &SessionRecord) -> Result<(), StoreError> {
        let key = keys::admin_session_key(&session.token_hash);
        let index_key = keys::admin_session_index_key(&session.admin_id, &session.token_hash);
        let session_bytes = Self::serialize(session)?;

        let key_bytes = key.as_bytes().to_vec();
        let index_key_bytes = index_key.as_bytes().to_vec();
        self.admin_sessions
            .transaction(move |tx| {
                tx.insert(key_bytes.as_slice(), session_bytes.as_slice())?;
                tx.insert(index_key_bytes.as_slice(), &[] as &[u8])?;
                Ok(())
            })
            .map_err(tx_error)?;
        Ok(())
    }

    /// 获取管理员会话，如果已过期或已撤销则返回 None。
    pub fn get_admin_session(&self, token_hash: &str) -> Result<Option<SessionRecord>, StoreError> {
        let key = keys::admin_session_key(token_hash);
        let Some(raw) = self.admin_sessions.get(key.as_bytes())? else {
            return Ok(None);
        };

        let session = Self::deserialize::<SessionRecord>(&raw)?;
        if session.revoked || session.expires_at <= Utc::now() {
            return Ok(None);
        }

        Ok(Some(session))
    }

    pub fn delete_admin_session(&self, token_hash: &str) -> Result<(), StoreError> {
        let key = keys::admin_session_key(token_hash);
        let session_key_bytes = key.as_bytes().to_vec();
        let index_key_bytes = self
            .admin_sessions
            .get(key.as_bytes())?
            .and_then(|raw| Self::deserialize::<SessionRecord>(&raw).ok())
            .map(|session| {
                keys::admin_session_index_key(&session.admin_id, token_hash)
                    .as_bytes()
                    .to_vec()
            });

        self.admin_sessions
            .transaction(move |tx| {
                if let Some(ref idx_key) = index_key_bytes {
                    tx.remove(idx_key.as_slice())?;
                }
                tx.remove(session_key_bytes.as_slice())?;
                Ok(())
            })
            .map_err(tx_error)?;

        Ok(())
    }

    /// 清理过期或已撤销的管理员会话，返回删除数量。
    pub fn cleanup_expired_admin_sessions(&self) -> Result<u32, StoreError> {
        let now = Utc::now();
        let mut expired = Vec::new();
        for item in self.admin_sessions.iter() {
            let (k, v) = item?;
            if k.starts_with(b"admin:") {
                continue;
            }
            let session: SessionRecord = Self::deserialize(&v)?;
            if session.expires_at <= now || session.revoked {
                expired.push(session.token_hash);
            }
        }

        let count = expired.len() as u32;
        for token_hash in expired {
            self.delete_admin_session(&token_hash)?;
        }

        Ok(count)
    }
}
