use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::admin::{
    BulkReport, CollectionController, ControllerError, FilterState, Phase, PublishFilter,
    SortDirection, SortField,
};
use crate::auth::AdminSession;
use crate::constants::MAX_BULK_IDS;
use crate::content::{
    Achievement, ContactMessage, ContentKind, Course, Document, News, Record, Teacher,
};
use crate::extractors::{JsonBody, QueryParams};
use crate::i18n::Locale;
use crate::response::{created, ok, AppError};
use crate::state::AppState;

/// 按内容类型把请求分派到对应记录类型的泛型处理函数
macro_rules! with_record_type {
    ($kind:expr, $handler:ident ( $($arg:expr),* $(,)? )) => {
        match $kind {
            ContentKind::News => $handler::<News>($($arg),*).await,
            ContentKind::Achievement => $handler::<Achievement>($($arg),*).await,
            ContentKind::Teacher => $handler::<Teacher>($($arg),*).await,
            ContentKind::Course => $handler::<Course>($($arg),*).await,
            ContentKind::ContactMessage => $handler::<ContactMessage>($($arg),*).await,
        }
    };
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:kind", get(list).post(create))
        .route("/:kind/bulk-delete", post(bulk_delete))
        .route("/:kind/bulk-status", post(bulk_status))
        .route("/:kind/:id", put(update).delete(delete_one))
        .route("/:kind/:id/toggle", post(toggle))
}

fn parse_kind(slug: &str) -> Result<ContentKind, AppError> {
    ContentKind::from_slug(slug)
        .ok_or_else(|| AppError::not_found(&format!("Unknown content type: {slug}")))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocaleParam {
    #[serde(default)]
    locale: Option<Locale>,
}

impl LocaleParam {
    fn locale(&self) -> Locale {
        self.locale.unwrap_or(Locale::DEFAULT)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    #[serde(default)]
    status: Option<PublishFilter>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    sort: Option<SortField>,
    #[serde(default)]
    order: Option<SortDirection>,
    #[serde(default)]
    locale: Option<Locale>,
}

impl ListParams {
    fn filter(&self) -> FilterState {
        FilterState {
            publish: self.status.unwrap_or_default(),
            category: self.category.clone(),
            search: self.q.clone().unwrap_or_default(),
            sort_field: self.sort.unwrap_or_default(),
            sort_direction: self.order.unwrap_or_default(),
        }
        .normalized()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    kind: ContentKind,
    records: Vec<Value>,
    total: usize,
    visible: usize,
    filter: FilterState,
    phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MutationResponse {
    record: Value,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleRequest {
    current: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkDeleteRequest {
    ids: Vec<String>,
    #[serde(default)]
    filter: Option<FilterState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkStatusRequest {
    ids: Vec<String>,
    value: bool,
    #[serde(default)]
    filter: Option<FilterState>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkDeleteResponse {
    #[serde(flatten)]
    report: BulkReport,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkStatusResponse {
    updated: usize,
    message: String,
}

fn to_value<T: Serialize>(record: &T) -> Result<Value, AppError> {
    serde_json::to_value(record).map_err(|e| AppError::internal(&e.to_string()))
}

/// 批量操作的忙碌与空选择错误使用界面语言提示
fn localized_error(state: &AppState, locale: Locale, err: ControllerError) -> AppError {
    let translations = state.translations();
    match err {
        ControllerError::Busy => {
            AppError::conflict("ADMIN_BUSY", translations.get(locale, "admin.busy"))
        }
        ControllerError::EmptySelection => AppError::bad_request(
            "EMPTY_SELECTION",
            translations.get(locale, "admin.empty_selection"),
        ),
        other => other.into(),
    }
}

fn check_bulk_size(ids: &[String]) -> Result<(), AppError> {
    if ids.len() > MAX_BULK_IDS {
        return Err(AppError::bad_request(
            "TOO_MANY_IDS",
            &format!("At most {MAX_BULK_IDS} records per bulk operation"),
        ));
    }
    Ok(())
}

/// 构造控制器并加载集合；加载失败直接作为请求错误返回
async fn loaded<T: Record>(
    state: &AppState,
    session: &AdminSession,
) -> Result<CollectionController<T>, AppError> {
    let mut controller = state.controller::<T>(session.access());
    controller.load().await?;
    Ok(controller)
}

async fn list(
    session: AdminSession,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let response = with_record_type!(kind, list_records(&state, &session, &params))?;
    Ok(ok(response))
}

async fn list_records<T: Record>(
    state: &AppState,
    session: &AdminSession,
    params: &ListParams,
) -> Result<ListResponse, AppError> {
    let locale = params.locale.unwrap_or(Locale::DEFAULT);
    let mut controller = state.controller::<T>(session.access());

    // 加载失败时返回空列表和错误提示，界面保持可用
    let (message, error) = match controller.load().await {
        Ok(count) => (
            Some(state.translations().format(
                locale,
                "admin.loaded",
                &[("count", count.to_string())],
            )),
            None,
        ),
        Err(e) => (
            None,
            Some(format!(
                "{}: {e}",
                state.translations().get(locale, "admin.load_failed")
            )),
        ),
    };
    controller.apply_filter(params.filter());

    let records = controller
        .visible_records()
        .into_iter()
        .map(to_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ListResponse {
        kind: T::KIND,
        total: controller.records().len(),
        visible: records.len(),
        records,
        filter: controller.filter().clone(),
        phase: controller.phase().clone(),
        message,
        error,
    })
}

async fn create(
    session: AdminSession,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    QueryParams(lang): QueryParams<LocaleParam>,
    JsonBody(fields): JsonBody<Document>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let record = with_record_type!(kind, create_record(&state, &session, fields))?;
    Ok(created(MutationResponse {
        record,
        message: state
            .translations()
            .get(lang.locale(), "admin.created")
            .to_string(),
    }))
}

async fn create_record<T: Record>(
    state: &AppState,
    session: &AdminSession,
    fields: Document,
) -> Result<Value, AppError> {
    let mut controller = state.controller::<T>(session.access());
    let record = controller.create(fields).await?;
    to_value(&record)
}

async fn update(
    session: AdminSession,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    QueryParams(lang): QueryParams<LocaleParam>,
    JsonBody(fields): JsonBody<Document>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let record = with_record_type!(kind, update_record(&state, &session, &id, fields))?;
    Ok(ok(MutationResponse {
        record,
        message: state
            .translations()
            .get(lang.locale(), "admin.updated")
            .to_string(),
    }))
}

async fn update_record<T: Record>(
    state: &AppState,
    session: &AdminSession,
    id: &str,
    fields: Document,
) -> Result<Value, AppError> {
    let mut controller = loaded::<T>(state, session).await?;
    let record = controller.update(id, fields).await?;
    to_value(&record)
}

async fn delete_one(
    session: AdminSession,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    QueryParams(lang): QueryParams<LocaleParam>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    with_record_type!(kind, delete_record(&state, &session, &id))?;
    Ok(ok(serde_json::json!({
        "id": id,
        "message": state.translations().get(lang.locale(), "admin.deleted"),
    })))
}

async fn delete_record<T: Record>(
    state: &AppState,
    session: &AdminSession,
    id: &str,
) -> Result<(), AppError> {
    let mut controller = loaded::<T>(state, session).await?;
    controller.delete_one(id).await?;
    Ok(())
}

async fn toggle(
    session: AdminSession,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    QueryParams(lang): QueryParams<LocaleParam>,
    JsonBody(req): JsonBody<ToggleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let (record, status) =
        with_record_type!(kind, toggle_record(&state, &session, &id, req.current))?;
    let key = if status {
        "admin.status.published"
    } else {
        "admin.status.unpublished"
    };
    Ok(ok(MutationResponse {
        record,
        message: state.translations().get(lang.locale(), key).to_string(),
    }))
}

async fn toggle_record<T: Record>(
    state: &AppState,
    session: &AdminSession,
    id: &str,
    current: bool,
) -> Result<(Value, bool), AppError> {
    let mut controller = loaded::<T>(state, session).await?;
    let record = controller.toggle_published(id, current).await?;
    Ok((to_value(&record)?, record.status()))
}

async fn bulk_delete(
    session: AdminSession,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    QueryParams(lang): QueryParams<LocaleParam>,
    JsonBody(req): JsonBody<BulkDeleteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    check_bulk_size(&req.ids)?;
    let report =
        with_record_type!(kind, bulk_delete_records(&state, &session, &req, lang.locale()))?;
    let message = state.translations().format(
        lang.locale(),
        "admin.bulk_delete.summary",
        &[
            ("deleted", report.succeeded.to_string()),
            ("failed", report.failed.to_string()),
        ],
    );
    Ok(ok(BulkDeleteResponse { report, message }))
}

async fn bulk_delete_records<T: Record>(
    state: &AppState,
    session: &AdminSession,
    req: &BulkDeleteRequest,
    locale: Locale,
) -> Result<BulkReport, AppError> {
    let mut controller = loaded::<T>(state, session).await?;
    controller.apply_filter(req.filter.clone().unwrap_or_default().normalized());
    for id in &req.ids {
        if !controller.toggle_select_one(id, true) {
            tracing::debug!(kind = %T::KIND, id = %id, "ignoring id outside the visible rows");
        }
    }
    controller
        .bulk_delete()
        .await
        .map_err(|e| localized_error(state, locale, e))
}

async fn bulk_status(
    session: AdminSession,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    QueryParams(lang): QueryParams<LocaleParam>,
    JsonBody(req): JsonBody<BulkStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    check_bulk_size(&req.ids)?;
    let updated =
        with_record_type!(kind, bulk_status_records(&state, &session, &req, lang.locale()))?;
    let key = if req.value {
        "admin.bulk_status.published"
    } else {
        "admin.bulk_status.unpublished"
    };
    let message =
        state
            .translations()
            .format(lang.locale(), key, &[("count", updated.to_string())]);
    Ok(ok(BulkStatusResponse { updated, message }))
}

async fn bulk_status_records<T: Record>(
    state: &AppState,
    session: &AdminSession,
    req: &BulkStatusRequest,
    locale: Locale,
) -> Result<usize, AppError> {
    let mut controller = loaded::<T>(state, session).await?;
    controller.apply_filter(req.filter.clone().unwrap_or_default().normalized());
    let visible = controller.visible_ids();
    let ids: Vec<String> = req
        .ids
        .iter()
        .filter(|id| visible.contains(*id))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    controller
        .bulk_set_published(&ids, req.value)
        .await
        .map_err(|e| localized_error(state, locale, e))
}
