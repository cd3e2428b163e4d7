pub mod auth;
pub mod content;
pub mod uploads;

use axum::Router;

use crate::state::AppState;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/content", content::router())
        .nest("/uploads", uploads::router(max_upload_bytes))
}
