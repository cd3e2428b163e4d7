//! Content model shared by the public site and the admin CMS.
//!
//! Records are persisted as JSON documents behind [`ContentStore`]; images
//! live behind [`BlobStore`]. Both are injected, never reached globally.

pub mod blob;
pub mod types;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::i18n::Locale;
use crate::store::StoreError;

pub use blob::{BlobError, FsBlobStore};
pub use types::{Achievement, ContactMessage, Course, News, Teacher};

pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    News,
    Achievement,
    Teacher,
    Course,
    ContactMessage,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        ContentKind::News,
        ContentKind::Achievement,
        ContentKind::Teacher,
        ContentKind::Course,
        ContentKind::ContactMessage,
    ];

    /// URL segment used by the HTTP API.
    pub fn slug(self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Achievement => "achievements",
            ContentKind::Teacher => "teachers",
            ContentKind::Course => "courses",
            ContentKind::ContactMessage => "contact-messages",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    /// Name of the boolean status field: `published`, or `responded` for contact messages.
    pub fn status_field(self) -> &'static str {
        match self {
            ContentKind::ContactMessage => "responded",
            _ => "published",
        }
    }

    pub fn has_category(self) -> bool {
        matches!(
            self,
            ContentKind::News | ContentKind::Achievement | ContentKind::Course
        )
    }

    /// Whether anonymous visitors may read published records of this kind.
    pub fn is_public(self) -> bool {
        !matches!(self, ContentKind::ContactMessage)
    }

    pub fn image_bucket(self) -> Option<&'static str> {
        match self {
            ContentKind::News => Some("news-images"),
            ContentKind::Achievement => Some("achievement-images"),
            ContentKind::Teacher => Some("teacher-images"),
            ContentKind::Course => Some("course-images"),
            ContentKind::ContactMessage => None,
        }
    }

    pub fn default_order(self) -> ListOrder {
        match self {
            ContentKind::Teacher | ContentKind::Course => ListOrder::SortOrder,
            _ => ListOrder::NewestFirst,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Privilege level of a store call. Restricted calls are what an anonymous
/// visitor may do; the store enforces this itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Privileged,
    Restricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    #[default]
    NewestFirst,
    SortOrder,
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub category: Option<String>,
    pub order: ListOrder,
}

impl ListQuery {
    pub fn ordered(order: ListOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum Outcome {
    Ok,
    Error(String),
}

/// Per-id result of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub id: String,
    pub outcome: Outcome,
}

impl BulkOutcome {
    pub fn ok(id: &str) -> Self {
        Self {
            id: id.to_string(),
            outcome: Outcome::Ok,
        }
    }

    pub fn error(id: &str, reason: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            outcome: Outcome::Error(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Ok
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list(
        &self,
        kind: ContentKind,
        query: &ListQuery,
        access: Access,
    ) -> Result<Vec<Document>, StoreError>;

    async fn get(
        &self,
        kind: ContentKind,
        id: &str,
        access: Access,
    ) -> Result<Option<Document>, StoreError>;

    /// Inserts a new record; the store assigns `id`, `createdAt` and `updatedAt`.
    async fn insert(
        &self,
        kind: ContentKind,
        fields: Document,
        access: Access,
    ) -> Result<Document, StoreError>;

    /// Merges `patch` into the record. `Ok(None)` if it does not exist.
    async fn update(
        &self,
        kind: ContentKind,
        id: &str,
        patch: Document,
        access: Access,
    ) -> Result<Option<Document>, StoreError>;

    async fn delete(&self, kind: ContentKind, id: &str, access: Access)
        -> Result<bool, StoreError>;

    /// Applies `patch` to every existing id atomically and returns the updated records.
    async fn update_many(
        &self,
        kind: ContentKind,
        ids: &[String],
        patch: Document,
        access: Access,
    ) -> Result<Vec<Document>, StoreError>;

    async fn delete_many(
        &self,
        kind: ContentKind,
        ids: &[String],
        access: Access,
    ) -> Result<Vec<BulkOutcome>, StoreError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `bucket/path` and returns the public URL.
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String, BlobError>;

    async fn delete(&self, url: &str) -> Result<(), BlobError>;

    fn get_url(&self, bucket: &str, path: &str) -> String;
}

/// A typed view over one content kind's documents.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ContentKind;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    /// `published`, or `responded` for contact messages.
    fn status(&self) -> bool;

    fn image_url(&self) -> Option<&str> {
        None
    }

    fn category(&self) -> Option<&str> {
        None
    }

    /// Text searched by the admin list filter.
    fn search_fields(&self) -> Vec<&str>;

    /// Text compared when sorting by title.
    fn title(&self) -> &str;

    fn sort_order(&self) -> i64 {
        0
    }
}

/// Records shown on the public site.
pub trait PublicRecord: Record {
    fn localized(&self, locale: Locale) -> Value;
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Validation(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}
