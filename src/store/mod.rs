pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

use crate::content::ContentKind;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub news: sled::Tree,
    pub achievements: sled::Tree,
    pub teachers: sled::Tree,
    pub courses: sled::Tree,
    pub contact_messages: sled::Tree,
    pub admins: sled::Tree,
    pub admin_sessions: sled::Tree,
    pub meta: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("conflict: entity={entity}, key={key}")]
    Conflict { entity: String, key: String },
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let news = db.open_tree(trees::NEWS)?;
        let achievements = db.open_tree(trees::ACHIEVEMENTS)?;
        let teachers = db.open_tree(trees::TEACHERS)?;
        let courses = db.open_tree(trees::COURSES)?;
        let contact_messages = db.open_tree(trees::CONTACT_MESSAGES)?;
        let admins = db.open_tree(trees::ADMINS)?;
        let admin_sessions = db.open_tree(trees::ADMIN_SESSIONS)?;
        let meta = db.open_tree(trees::META)?;

        Ok(Self {
            db,
            news,
            achievements,
            teachers,
            courses,
            contact_messages,
            admins,
            admin_sessions,
            meta,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    /// Tree holding the documents of one content kind.
    pub fn content_tree(&self, kind: ContentKind) -> &sled::Tree {
        match kind {
            ContentKind::News => &self.news,
            ContentKind::Achievement => &self.achievements,
            ContentKind::Teacher => &self.teachers,
            ContentKind::Course => &self.courses,
            ContentKind::ContactMessage => &self.contact_messages,
        }
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Maps a sled transaction failure back onto `StoreError`.
pub(crate) fn tx_error(e: sled::transaction::TransactionError<StoreError>) -> StoreError {
    match e {
        sled::transaction::TransactionError::Abort(inner) => inner,
        sled::transaction::TransactionError::Storage(se) => StoreError::Sled(se),
    }
}
