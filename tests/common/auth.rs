use axum::http::{HeaderMap, Method};
use axum::Router;

use super::http::{request, response_json};

pub const ADMIN_PASSWORD: &str = "AdminPassw0rd!";

/// 从 Set-Cookie header 中提取指定 cookie 的值
pub fn extract_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for value in headers.get_all("set-cookie") {
        if let Ok(s) = value.to_str() {
            // cookie 格式: "name=value; Path=/; ..."
            if let Some(rest) = s.strip_prefix(&format!("{cookie_name}=")) {
                let val = rest.split(';').next().unwrap_or("");
                if !val.is_empty() {
                    return Some(val.to_string());
                }
            }
        }
    }
    None
}

pub fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn session_cookie_header(token: &str) -> String {
    format!("sb-access-token={token}")
}

/// 创建首个管理员并登录，返回 (token, Set-Cookie 中的会话值)
pub async fn setup_admin_and_login(app: &Router) -> (String, String) {
    let email = format!("admin-{}@school.test", uuid::Uuid::new_v4().simple());

    let response = request(
        app,
        Method::POST,
        "/api/admin/auth/setup",
        Some(serde_json::json!({ "email": email, "password": ADMIN_PASSWORD })),
        &[],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert!(status.is_success(), "admin setup failed: {body}");

    let response = request(
        app,
        Method::POST,
        "/api/admin/auth/login",
        Some(serde_json::json!({ "email": email, "password": ADMIN_PASSWORD })),
        &[],
    )
    .await;
    let (status, headers, body) = response_json(response).await;
    assert!(status.is_success(), "admin login failed: {body}");

    let token = body["data"]["token"]
        .as_str()
        .expect("admin token in login response")
        .to_string();
    let cookie = extract_cookie_value(&headers, "sb-access-token")
        .expect("session cookie in login response");
    (token, cookie)
}

pub async fn setup_admin_and_get_token(app: &Router) -> String {
    setup_admin_and_login(app).await.0
}
