pub mod admin;
pub mod content;
pub mod health;

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::constants::{STATIC_PREFIX, UPLOADS_URL_PREFIX};
use crate::middleware::{locale, request_id};
use crate::state::AppState;

/// JSON 接口的请求体上限：1 MiB，上传接口单独配置
const MAX_BODY_SIZE: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let config = state.config().clone();

    let api_routes = Router::new()
        .nest("/content", content::router())
        .route("/contact", post(content::submit_contact))
        .route("/i18n/:locale", get(content::dictionary))
        .nest("/health", health::router())
        .nest("/admin", admin::router(config.media.max_upload_bytes))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    // 上传文件与站点静态资源；其余页面路径回落到前端入口
    let static_dir = Path::new(&config.media.static_dir);
    let spa_fallback =
        ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let uploads_subpath = UPLOADS_URL_PREFIX
        .strip_prefix(STATIC_PREFIX)
        .unwrap_or(UPLOADS_URL_PREFIX);
    let static_routes = Router::new()
        .nest_service(uploads_subpath, ServeDir::new(&config.media.upload_dir))
        .fallback_service(ServeDir::new(static_dir));

    Router::new()
        .nest("/api", api_routes)
        .route(
            "/signout",
            get(admin::auth::signout).post(admin::auth::signout),
        )
        .nest(STATIC_PREFIX, static_routes)
        .fallback_service(spa_fallback)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            locale::locale_middleware,
        ))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}
