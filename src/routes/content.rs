use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::{
    from_document, to_document, Access, Achievement, ContactMessage, ContentKind, Course,
    Document, ListQuery, News, PublicRecord, Record, Teacher,
};
use crate::extractors::{JsonBody, QueryParams};
use crate::i18n::Locale;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::validation::validate_contact;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:kind", get(list_public))
        .route("/:kind/:id", get(get_public))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicParams {
    #[serde(default)]
    locale: Option<Locale>,
    #[serde(default)]
    category: Option<String>,
}

impl PublicParams {
    fn locale(&self) -> Locale {
        self.locale.unwrap_or(Locale::DEFAULT)
    }
}

/// 只有公开类型可通过匿名接口访问
fn public_kind(slug: &str) -> Result<ContentKind, AppError> {
    ContentKind::from_slug(slug)
        .filter(|kind| kind.is_public())
        .ok_or_else(|| AppError::not_found(&format!("Unknown content type: {slug}")))
}

fn localize<T: PublicRecord>(document: Document, locale: Locale) -> Option<Value> {
    match from_document::<T>(document) {
        Ok(record) => Some(record.localized(locale)),
        Err(e) => {
            tracing::warn!(kind = %T::KIND, error = %e, "Skipping malformed public record");
            None
        }
    }
}

fn localize_as(kind: ContentKind, document: Document, locale: Locale) -> Option<Value> {
    match kind {
        ContentKind::News => localize::<News>(document, locale),
        ContentKind::Achievement => localize::<Achievement>(document, locale),
        ContentKind::Teacher => localize::<Teacher>(document, locale),
        ContentKind::Course => localize::<Course>(document, locale),
        ContentKind::ContactMessage => None,
    }
}

async fn list_public(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    QueryParams(params): QueryParams<PublicParams>,
) -> Result<impl IntoResponse, AppError> {
    let kind = public_kind(&kind)?;
    let locale = params.locale();
    let query = ListQuery {
        category: params
            .category
            .filter(|c| kind.has_category() && !c.trim().is_empty()),
        ..ListQuery::ordered(kind.default_order())
    };

    let documents = state.content().list(kind, &query, Access::Restricted).await?;
    let records: Vec<Value> = documents
        .into_iter()
        .filter_map(|doc| localize_as(kind, doc, locale))
        .collect();
    Ok(ok(records))
}

async fn get_public(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    QueryParams(params): QueryParams<PublicParams>,
) -> Result<impl IntoResponse, AppError> {
    let kind = public_kind(&kind)?;
    let document = state
        .content()
        .get(kind, &id, Access::Restricted)
        .await?
        .ok_or_else(|| AppError::not_found("Record not found"))?;
    let record = localize_as(kind, document, params.locale())
        .ok_or_else(|| AppError::internal("Stored record could not be decoded"))?;
    Ok(ok(record))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    name: String,
    email: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    subject: String,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContactResponse {
    id: String,
    message: String,
}

/// 公开联系表单，以受限权限写入，状态强制为未回复
pub async fn submit_contact(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<PublicParams>,
    JsonBody(form): JsonBody<ContactForm>,
) -> Result<impl IntoResponse, AppError> {
    validate_contact(
        &form.name,
        &form.email,
        form.phone.as_deref(),
        &form.subject,
        &form.message,
    )
    .map_err(|msg| AppError::bad_request("INVALID_CONTACT_FORM", &msg))?;

    let phone = form
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    let fields = to_document(&serde_json::json!({
        "name": form.name.trim(),
        "email": form.email.trim().to_lowercase(),
        "phone": phone,
        "subject": form.subject.trim(),
        "message": form.message.trim(),
    }))?;

    let inserted = state
        .content()
        .insert(ContentKind::ContactMessage, fields, Access::Restricted)
        .await?;
    let saved: ContactMessage = from_document(inserted)?;
    tracing::info!(id = %saved.id(), "contact message received");

    Ok(created(ContactResponse {
        id: saved.id,
        message: state
            .translations()
            .get(params.locale(), "contact.sent")
            .to_string(),
    }))
}

pub async fn dictionary(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let locale =
        Locale::parse(&code).ok_or_else(|| AppError::not_found(&format!("Unknown locale: {code}")))?;
    Ok(ok(serde_json::json!({
        "locale": locale,
        "messages": state.translations().dictionary(locale),
    })))
}
