use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth::AdminSession;
use crate::content::ContentKind;
use crate::extractors::QueryParams;
use crate::i18n::Locale;
use crate::response::{created, AppError};
use crate::state::AppState;
use crate::validation::validate_image_filename;

/// 上传接口单独放宽请求体上限
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/:kind", post(upload_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadParams {
    filename: String,
    #[serde(default)]
    locale: Option<Locale>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    url: String,
    size: usize,
    message: String,
}

async fn upload_image(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    QueryParams(params): QueryParams<UploadParams>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let kind = ContentKind::from_slug(&kind)
        .ok_or_else(|| AppError::not_found(&format!("Unknown content type: {kind}")))?;
    let bucket = kind.image_bucket().ok_or_else(|| {
        AppError::bad_request("UPLOAD_NOT_SUPPORTED", &format!("{kind} records have no images"))
    })?;

    let extension = validate_image_filename(&params.filename)
        .map_err(AppError::unsupported_media_type)?;
    if body.is_empty() {
        return Err(AppError::bad_request("EMPTY_UPLOAD", "Upload body is empty"));
    }
    let max = state.config().media.max_upload_bytes;
    if body.len() > max {
        return Err(AppError::payload_too_large(&format!(
            "Images must be at most {max} bytes"
        )));
    }

    let path = format!("{}.{extension}", uuid::Uuid::new_v4());
    let size = body.len();
    let url = state.blobs().upload(bucket, &path, body.to_vec()).await?;
    tracing::info!(kind = %kind, url = %url, size, "image uploaded");

    let locale = params.locale.unwrap_or(Locale::DEFAULT);
    Ok(created(UploadResponse {
        url,
        size,
        message: state
            .translations()
            .get(locale, "admin.upload_done")
            .to_string(),
    }))
}
