use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::admin::filter::{self, FilterState, PublishFilter, SortDirection, SortField};
use crate::content::{
    from_document, to_document, Access, BlobStore, BulkOutcome, ContentStore, Document,
    ListQuery, Record,
};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("another bulk operation is in progress")]
    Busy,
    #[error("no records selected")]
    EmptySelection,
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("invalid fields: {0}")]
    InvalidFields(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadError(String),
    Mutating,
    MutationError(String),
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<BulkOutcome>,
}

/// 批量操作期间持有，drop 时释放忙碌标记
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, ControllerError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ControllerError::Busy)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// List/filter/select/mutate state for one content kind in the admin.
///
/// Local `records` only change from documents the store has confirmed, and
/// `selection` is always a subset of the visible ids.
pub struct CollectionController<T: Record> {
    store: Arc<dyn ContentStore>,
    blobs: Arc<dyn BlobStore>,
    access: Access,
    records: Vec<T>,
    is_loading: bool,
    busy: Arc<AtomicBool>,
    filter: FilterState,
    selection: BTreeSet<String>,
    phase: Phase,
}

impl<T: Record> CollectionController<T> {
    pub fn new(store: Arc<dyn ContentStore>, blobs: Arc<dyn BlobStore>, access: Access) -> Self {
        Self {
            store,
            blobs,
            access,
            records: Vec::new(),
            is_loading: false,
            busy: Arc::new(AtomicBool::new(false)),
            filter: FilterState::default(),
            selection: BTreeSet::new(),
            phase: Phase::Idle,
        }
    }

    /// Shares the bulk-processing flag with other controllers of the same kind.
    pub fn with_busy_flag(mut self, busy: Arc<AtomicBool>) -> Self {
        self.busy = busy;
        self
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_bulk_processing(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub async fn load(&mut self) -> Result<usize, ControllerError> {
        self.is_loading = true;
        self.phase = Phase::Loading;
        let query = ListQuery::ordered(T::KIND.default_order());
        let result = self.store.list(T::KIND, &query, self.access).await;
        self.is_loading = false;

        let documents = match result {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!(kind = %T::KIND, error = %e, "Failed to load collection");
                self.records.clear();
                self.selection.clear();
                self.phase = Phase::LoadError(e.to_string());
                return Err(e.into());
            }
        };

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            match from_document::<T>(document) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(kind = %T::KIND, error = %e, "Skipping malformed record")
                }
            }
        }
        self.records = records;
        self.prune_selection();
        self.phase = Phase::Loaded;
        tracing::debug!(kind = %T::KIND, count = self.records.len(), "collection loaded");
        Ok(self.records.len())
    }

    pub fn visible_records(&self) -> Vec<&T> {
        filter::visible_records(&self.records, &self.filter)
    }

    pub fn visible_ids(&self) -> BTreeSet<String> {
        self.visible_records()
            .into_iter()
            .map(|r| r.id().to_string())
            .collect()
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.filter.search = query.into();
        self.selection.clear();
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.filter.category = category;
        self.selection.clear();
    }

    pub fn set_publish_filter(&mut self, publish: PublishFilter) {
        self.filter.publish = publish;
        self.selection.clear();
    }

    /// Sorting does not change which rows are visible, so the selection survives.
    pub fn set_sort(&mut self, field: SortField, direction: SortDirection) {
        self.filter.sort_field = field;
        self.filter.sort_direction = direction;
    }

    pub fn apply_filter(&mut self, state: FilterState) {
        self.set_sort(state.sort_field, state.sort_direction);
        self.set_publish_filter(state.publish);
        self.set_category(state.category);
        self.set_search(state.search);
    }

    pub fn toggle_select_all(&mut self, checked: bool) {
        self.selection = if checked {
            self.visible_ids()
        } else {
            BTreeSet::new()
        };
    }

    /// Returns false when a hidden id was asked to be selected; it is ignored.
    pub fn toggle_select_one(&mut self, id: &str, checked: bool) -> bool {
        if !checked {
            self.selection.remove(id);
            return true;
        }
        let visible = self.visible_records().iter().any(|r| r.id() == id);
        if visible {
            self.selection.insert(id.to_string());
        }
        visible
    }

    pub async fn delete_one(&mut self, id: &str) -> Result<(), ControllerError> {
        self.ensure_idle()?;
        let image_url = self
            .find(id)
            .ok_or_else(|| ControllerError::NotFound(id.to_string()))?
            .image_url()
            .map(str::to_string);

        self.phase = Phase::Mutating;
        if let Some(url) = image_url {
            self.delete_blob(&url).await;
        }

        match self.store.delete(T::KIND, id, self.access).await {
            Ok(true) => {
                self.records.retain(|r| r.id() != id);
                self.selection.remove(id);
                self.phase = Phase::Loaded;
                Ok(())
            }
            Ok(false) => Err(self.fail(ControllerError::NotFound(id.to_string()))),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    pub async fn bulk_delete(&mut self) -> Result<BulkReport, ControllerError> {
        self.ensure_idle()?;
        if self.selection.is_empty() {
            return Err(ControllerError::EmptySelection);
        }
        let _guard = BusyGuard::acquire(&self.busy)?;
        self.phase = Phase::Mutating;

        let selected: Vec<String> = self.selection.iter().cloned().collect();
        let mut outcomes = Vec::with_capacity(selected.len());
        let mut resolved = Vec::with_capacity(selected.len());
        for id in &selected {
            let Some(record) = self.find(id) else {
                outcomes.push(BulkOutcome::error(id, "not loaded"));
                continue;
            };
            if let Some(url) = record.image_url().map(str::to_string) {
                self.delete_blob(&url).await;
            }
            resolved.push(id.clone());
        }

        if !resolved.is_empty() {
            match self.store.delete_many(T::KIND, &resolved, self.access).await {
                Ok(results) => outcomes.extend(results),
                Err(e) => {
                    tracing::error!(kind = %T::KIND, error = %e, "Bulk delete failed");
                    let reason = e.to_string();
                    outcomes.extend(resolved.iter().map(|id| BulkOutcome::error(id, &reason)));
                }
            }
        }

        let deleted: BTreeSet<&str> = outcomes
            .iter()
            .filter(|o| o.is_ok())
            .map(|o| o.id.as_str())
            .collect();
        self.records.retain(|r| !deleted.contains(r.id()));
        self.selection.clear();

        let succeeded = deleted.len();
        let report = BulkReport {
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
        };
        self.phase = Phase::Loaded;
        tracing::info!(
            kind = %T::KIND,
            succeeded = report.succeeded,
            failed = report.failed,
            "bulk delete finished"
        );
        Ok(report)
    }

    pub async fn toggle_published(&mut self, id: &str, current: bool) -> Result<T, ControllerError> {
        self.ensure_idle()?;
        self.phase = Phase::Mutating;
        let patch = status_patch::<T>(!current);
        let updated = match self.store.update(T::KIND, id, patch, self.access).await {
            Ok(Some(document)) => document,
            Ok(None) => return Err(self.fail(ControllerError::NotFound(id.to_string()))),
            Err(e) => return Err(self.fail(e.into())),
        };
        let record = match from_document::<T>(updated) {
            Ok(record) => record,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.splice(record.clone());
        self.phase = Phase::Loaded;
        Ok(record)
    }

    /// One `update_many` call for the whole set.
    pub async fn bulk_set_published(
        &mut self,
        ids: &[String],
        value: bool,
    ) -> Result<usize, ControllerError> {
        self.ensure_idle()?;
        if ids.is_empty() {
            return Err(ControllerError::EmptySelection);
        }
        let _guard = BusyGuard::acquire(&self.busy)?;
        self.phase = Phase::Mutating;

        let patch = status_patch::<T>(value);
        let documents = match self
            .store
            .update_many(T::KIND, ids, patch, self.access)
            .await
        {
            Ok(documents) => documents,
            Err(e) => return Err(self.fail(e.into())),
        };

        let mut updated = Vec::with_capacity(documents.len());
        for document in documents {
            match from_document::<T>(document) {
                Ok(record) => updated.push(record),
                Err(e) => return Err(self.fail(e.into())),
            }
        }
        let count = updated.len();
        for record in updated {
            self.splice(record);
        }
        self.phase = Phase::Loaded;
        tracing::info!(kind = %T::KIND, count, value, "bulk status updated");
        Ok(count)
    }

    pub async fn create(&mut self, fields: Document) -> Result<T, ControllerError> {
        self.ensure_idle()?;
        validate_new::<T>(&fields)?;
        self.phase = Phase::Mutating;

        let inserted = match self.store.insert(T::KIND, fields, self.access).await {
            Ok(document) => document,
            Err(e) => return Err(self.fail(e.into())),
        };
        let record = match from_document::<T>(inserted) {
            Ok(record) => record,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.records.insert(0, record.clone());
        self.phase = Phase::Loaded;
        Ok(record)
    }

    pub async fn update(&mut self, id: &str, fields: Document) -> Result<T, ControllerError> {
        self.ensure_idle()?;
        let existing = self
            .find(id)
            .ok_or_else(|| ControllerError::NotFound(id.to_string()))?;
        let previous_image = existing.image_url().map(str::to_string);
        validate_patch(existing, &fields)?;
        self.phase = Phase::Mutating;

        let updated = match self.store.update(T::KIND, id, fields, self.access).await {
            Ok(Some(document)) => document,
            Ok(None) => return Err(self.fail(ControllerError::NotFound(id.to_string()))),
            Err(e) => return Err(self.fail(e.into())),
        };
        let record = match from_document::<T>(updated) {
            Ok(record) => record,
            Err(e) => return Err(self.fail(e.into())),
        };

        if let Some(old) = previous_image {
            if record.image_url() != Some(old.as_str()) {
                self.delete_blob(&old).await;
            }
        }
        self.splice(record.clone());
        self.phase = Phase::Loaded;
        Ok(record)
    }

    fn ensure_idle(&self) -> Result<(), ControllerError> {
        if self.is_bulk_processing() {
            return Err(ControllerError::Busy);
        }
        Ok(())
    }

    fn fail(&mut self, err: ControllerError) -> ControllerError {
        tracing::warn!(kind = %T::KIND, error = %err, "Content mutation failed");
        self.phase = Phase::MutationError(err.to_string());
        err
    }

    async fn delete_blob(&self, url: &str) {
        if let Err(e) = self.blobs.delete(url).await {
            tracing::warn!(kind = %T::KIND, url, error = %e, "Failed to delete image, continuing");
        }
    }

    /// 用存储确认后的记录替换本地副本，并保持选择集不变式
    fn splice(&mut self, record: T) {
        match self.records.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => *slot = record,
            None => self.records.push(record),
        }
        self.prune_selection();
    }

    fn prune_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let visible = self.visible_ids();
        self.selection.retain(|id| visible.contains(id));
    }
}

fn status_patch<T: Record>(value: bool) -> Document {
    let mut patch = Document::new();
    patch.insert(T::KIND.status_field().to_string(), Value::Bool(value));
    patch
}

fn validate_new<T: Record>(fields: &Document) -> Result<(), ControllerError> {
    let mut candidate = fields.clone();
    let now = serde_json::to_value(Utc::now()).map_err(StoreError::from)?;
    candidate.insert("id".to_string(), Value::String(String::new()));
    candidate.insert("createdAt".to_string(), now.clone());
    candidate.insert("updatedAt".to_string(), now);
    from_document::<T>(candidate)
        .map(|_| ())
        .map_err(|e| ControllerError::InvalidFields(e.to_string()))
}

fn validate_patch<T: Record>(existing: &T, fields: &Document) -> Result<(), ControllerError> {
    let mut candidate = to_document(existing)?;
    for (field, value) in fields {
        if matches!(field.as_str(), "id" | "createdAt" | "updatedAt") {
            continue;
        }
        candidate.insert(field.clone(), value.clone());
    }
    from_document::<T>(candidate)
        .map(|_| ())
        .map_err(|e| ControllerError::InvalidFields(e.to_string()))
}
