use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::content::{
    Access, BulkOutcome, ContentKind, ContentStore, Document, ListOrder, ListQuery,
};
use crate::store::{keys, tx_error};
use crate::store::{Store, StoreError};

/// 由存储层维护、调用方不可写入的字段
const RESERVED_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

fn created_at_of(doc: &Document) -> Option<DateTime<Utc>> {
    doc.get("createdAt")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn status_of(kind: ContentKind, doc: &Document) -> bool {
    doc.get(kind.status_field())
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn compare_documents(order: ListOrder, a: &Document, b: &Document) -> Ordering {
    match order {
        ListOrder::NewestFirst => created_at_of(b).cmp(&created_at_of(a)),
        ListOrder::SortOrder => {
            let sort_a = a.get("sortOrder").and_then(Value::as_i64).unwrap_or(0);
            let sort_b = b.get("sortOrder").and_then(Value::as_i64).unwrap_or(0);
            sort_a
                .cmp(&sort_b)
                .then_with(|| created_at_of(a).cmp(&created_at_of(b)))
        }
    }
}

fn merge_patch(doc: &mut Document, patch: &Document, now: &Value) {
    for (field, value) in patch {
        if RESERVED_FIELDS.contains(&field.as_str()) {
            continue;
        }
        doc.insert(field.clone(), value.clone());
    }
    doc.insert("updatedAt".to_string(), now.clone());
}

fn require_privileged(kind: ContentKind, access: Access, action: &str) -> Result<(), StoreError> {
    match access {
        Access::Privileged => Ok(()),
        Access::Restricted => Err(StoreError::Forbidden(format!(
            "{action} on {kind} requires privileged access"
        ))),
    }
}

/// 受限访问只能读取公开类型中已发布的记录
fn visible_to(kind: ContentKind, access: Access, doc: &Document) -> bool {
    match access {
        Access::Privileged => true,
        Access::Restricted => kind.is_public() && status_of(kind, doc),
    }
}

impl Store {
    fn read_document(&self, kind: ContentKind, id: &str) -> Result<Option<Document>, StoreError> {
        let key = keys::content_key(id);
        match self.content_tree(kind).get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn count_documents(&self, kind: ContentKind) -> usize {
        self.content_tree(kind).len()
    }
}

#[async_trait]
impl ContentStore for Store {
    async fn list(
        &self,
        kind: ContentKind,
        query: &ListQuery,
        access: Access,
    ) -> Result<Vec<Document>, StoreError> {
        if access == Access::Restricted && !kind.is_public() {
            return Err(StoreError::Forbidden(format!(
                "listing {kind} requires privileged access"
            )));
        }

        let mut documents = Vec::new();
        for item in self.content_tree(kind).iter() {
            let (_, raw) = item?;
            let doc: Document = match Self::deserialize(&raw) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(kind = %kind, error = %e, "Skipping undecodable document");
                    continue;
                }
            };
            if !visible_to(kind, access, &doc) {
                continue;
            }
            if let Some(category) = query.category.as_deref() {
                if doc.get("category").and_then(Value::as_str) != Some(category) {
                    continue;
                }
            }
            documents.push(doc);
        }

        documents.sort_by(|a, b| compare_documents(query.order, a, b));
        Ok(documents)
    }

    async fn get(
        &self,
        kind: ContentKind,
        id: &str,
        access: Access,
    ) -> Result<Option<Document>, StoreError> {
        if access == Access::Restricted && !kind.is_public() {
            return Err(StoreError::Forbidden(format!(
                "reading {kind} requires privileged access"
            )));
        }
        Ok(self
            .read_document(kind, id)?
            .filter(|doc| visible_to(kind, access, doc)))
    }

    async fn insert(
        &self,
        kind: ContentKind,
        mut fields: Document,
        access: Access,
    ) -> Result<Document, StoreError> {
        if access == Access::Restricted {
            if kind != ContentKind::ContactMessage {
                return Err(StoreError::Forbidden(format!(
                    "creating {kind} requires privileged access"
                )));
            }
            fields.insert(kind.status_field().to_string(), Value::Bool(false));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = serde_json::to_value(Utc::now())?;
        for reserved in RESERVED_FIELDS {
            fields.remove(*reserved);
        }
        fields.insert("id".to_string(), Value::String(id.clone()));
        fields.insert("createdAt".to_string(), now.clone());
        fields.insert("updatedAt".to_string(), now);

        let key = keys::content_key(&id);
        let cas_result = self
            .content_tree(kind)
            .compare_and_swap(key.as_bytes(), None::<&[u8]>, Some(Self::serialize(&fields)?))?;
        if cas_result.is_err() {
            return Err(StoreError::Conflict {
                entity: kind.to_string(),
                key: id,
            });
        }

        tracing::info!(kind = %kind, id = %id, "content record created");
        Ok(fields)
    }

    async fn update(
        &self,
        kind: ContentKind,
        id: &str,
        patch: Document,
        access: Access,
    ) -> Result<Option<Document>, StoreError> {
        require_privileged(kind, access, "updating")?;

        let key = keys::content_key(id).into_bytes();
        let now = serde_json::to_value(Utc::now())?;
        let updated = self
            .content_tree(kind)
            .transaction(|tx| {
                let Some(raw) = tx.get(key.as_slice())? else {
                    return Ok(None);
                };
                let mut doc: Document = match serde_json::from_slice(&raw) {
                    Ok(doc) => doc,
                    Err(e) => return sled::transaction::abort(StoreError::Serialization(e)),
                };
                merge_patch(&mut doc, &patch, &now);
                let bytes = match serde_json::to_vec(&doc) {
                    Ok(bytes) => bytes,
                    Err(e) => return sled::transaction::abort(StoreError::Serialization(e)),
                };
                tx.insert(key.as_slice(), bytes)?;
                Ok(Some(doc))
            })
            .map_err(tx_error)?;

        Ok(updated)
    }

    async fn delete(
        &self,
        kind: ContentKind,
        id: &str,
        access: Access,
    ) -> Result<bool, StoreError> {
        require_privileged(kind, access, "deleting")?;
        let key = keys::content_key(id);
        let removed = self.content_tree(kind).remove(key.as_bytes())?.is_some();
        if removed {
            tracing::info!(kind = %kind, id = %id, "content record deleted");
        }
        Ok(removed)
    }

    async fn update_many(
        &self,
        kind: ContentKind,
        ids: &[String],
        patch: Document,
        access: Access,
    ) -> Result<Vec<Document>, StoreError> {
        require_privileged(kind, access, "updating")?;

        let now = serde_json::to_value(Utc::now())?;
        let key_list: Vec<Vec<u8>> = ids
            .iter()
            .map(|id| keys::content_key(id).into_bytes())
            .collect();

        // 单个事务内完成，全部成功或全部不生效
        let updated = self
            .content_tree(kind)
            .transaction(|tx| {
                let mut updated = Vec::with_capacity(key_list.len());
                for key in &key_list {
                    let Some(raw) = tx.get(key.as_slice())? else {
                        continue;
                    };
                    let mut doc: Document = match serde_json::from_slice(&raw) {
                        Ok(doc) => doc,
                        Err(e) => return sled::transaction::abort(StoreError::Serialization(e)),
                    };
                    merge_patch(&mut doc, &patch, &now);
                    let bytes = match serde_json::to_vec(&doc) {
                        Ok(bytes) => bytes,
                        Err(e) => return sled::transaction::abort(StoreError::Serialization(e)),
                    };
                    tx.insert(key.as_slice(), bytes)?;
                    updated.push(doc);
                }
                Ok(updated)
            })
            .map_err(tx_error)?;

        tracing::info!(kind = %kind, requested = ids.len(), updated = updated.len(), "bulk update applied");
        Ok(updated)
    }

    async fn delete_many(
        &self,
        kind: ContentKind,
        ids: &[String],
        access: Access,
    ) -> Result<Vec<BulkOutcome>, StoreError> {
        require_privileged(kind, access, "deleting")?;

        let tree = self.content_tree(kind);
        let outcomes = ids
            .iter()
            .map(|id| match tree.remove(keys::content_key(id).as_bytes()) {
                Ok(Some(_)) => BulkOutcome::ok(id),
                Ok(None) => BulkOutcome::error(id, "not found"),
                Err(e) => {
                    tracing::warn!(kind = %kind, id = %id, error = %e, "Failed to delete record");
                    BulkOutcome::error(id, e.to_string())
                }
            })
            .collect();
        Ok(outcomes)
    }
}
