use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::broadcast;

use school_site::config::{AdminAuthConfig, Config, CookieConfig, MediaConfig};
use school_site::constants::UPLOADS_URL_PREFIX;
use school_site::content::{BlobStore, ContentStore, FsBlobStore};
use school_site::routes::build_router;
use school_site::state::AppState;
use school_site::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

fn test_config(temp_dir: &TempDir, max_upload_bytes: usize) -> Config {
    let root = temp_dir.path();
    // 直接构造 Config，避免使用 set_var 造成多线程测试环境变量竞态
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: root.join("school-test.sled").to_string_lossy().to_string(),
        cors_origin: "http://localhost:3000".to_string(),
        admin: AdminAuthConfig {
            jwt_secret: format!("integration-test-admin-secret-{}", uuid::Uuid::new_v4()),
            jwt_expires_in_hours: 2,
        },
        cookies: CookieConfig {
            session_prefix: "sb-".to_string(),
            legacy_auth_cookie: "supabase-auth-token".to_string(),
            secure: false,
        },
        media: MediaConfig {
            upload_dir: root.join("uploads").to_string_lossy().to_string(),
            static_dir: root.join("public").to_string_lossy().to_string(),
            max_upload_bytes,
        },
    }
}

async fn spawn_with<C, F>(max_upload_bytes: usize, wrap: F) -> (TestApp, Arc<C>)
where
    C: ContentStore + 'static,
    F: FnOnce(Arc<Store>) -> Arc<C>,
{
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(&temp_dir, max_upload_bytes);

    std::fs::create_dir_all(&config.media.static_dir).expect("create static dir");
    std::fs::write(
        std::path::Path::new(&config.media.static_dir).join("index.html"),
        "<!doctype html><title>school</title>",
    )
    .expect("write index.html");

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let content = wrap(store.clone());
    let blobs: Arc<dyn BlobStore> =
        Arc::new(FsBlobStore::new(&config.media.upload_dir, UPLOADS_URL_PREFIX));
    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::with_services(store, content.clone(), blobs, &config, shutdown_tx);
    let app = build_router(state.clone());

    let test_app = TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    };
    (test_app, content)
}

async fn spawn_with_upload_limit(max_upload_bytes: usize) -> TestApp {
    let (app, _) = spawn_with(max_upload_bytes, |store| store).await;
    app
}

pub async fn spawn_test_server() -> TestApp {
    spawn_with_upload_limit(64 * 1024).await
}

pub async fn spawn_test_server_with_upload_limit(max_upload_bytes: usize) -> TestApp {
    spawn_with_upload_limit(max_upload_bytes).await
}

/// 用包装过的内容存储启动应用，返回包装实例以便测试控制其行为
pub async fn spawn_test_server_with_content<C, F>(wrap: F) -> (TestApp, Arc<C>)
where
    C: ContentStore + 'static,
    F: FnOnce(Arc<Store>) -> Arc<C>,
{
    spawn_with(64 * 1024, wrap).await
}
