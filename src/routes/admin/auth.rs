use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{
    dummy_password_hash, expired_cookie, extract_cookie, hash_password, hash_token,
    session_cookie, sign_admin_jwt, verify_password, AdminSession,
};
use crate::constants::{ADMIN_PREFIX, ADMIN_SESSION_COOKIE};
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::admins::Admin;
use crate::store::operations::sessions::SessionRecord;
use crate::validation::{is_valid_email, validate_password};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(auth_status))
        .route("/setup", post(setup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthStatusResponse {
    initialized: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Credentials {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminProfile {
    id: String,
    email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    expires_at: DateTime<Utc>,
    admin: AdminProfile,
}

async fn auth_status(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let initialized = state.store().any_admin_exists()?;
    Ok(ok(AuthStatusResponse { initialized }))
}

/// 仅在尚无管理员时可用
async fn setup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    if state.store().any_admin_exists()? {
        return Err(AppError::conflict(
            "ADMIN_ALREADY_EXISTS",
            "Admin account already exists",
        ));
    }

    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("ADMIN_INVALID_EMAIL", "Invalid email format"));
    }
    validate_password(&req.password)
        .map_err(|msg| AppError::bad_request("ADMIN_WEAK_PASSWORD", msg))?;

    let admin = Admin {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        password_hash: hash_password(&req.password)?,
        created_at: Utc::now(),
    };
    state.store().create_admin(&admin)?;
    tracing::info!(admin_id = %admin.id, "admin account created");

    Ok(created(AdminProfile {
        id: admin.id,
        email: admin.email,
    }))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let Some(admin) = state.store().get_admin_by_email(&req.email)? else {
        let _ = verify_password(&req.password, dummy_password_hash());
        return Err(AppError::unauthorized("Invalid email or password"));
    };
    if !verify_password(&req.password, &admin.password_hash)? {
        tracing::warn!(admin_id = %admin.id, "admin login rejected");
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let config = state.config();
    let token = sign_admin_jwt(
        &admin.id,
        &config.admin.jwt_secret,
        config.admin.jwt_expires_in_hours,
    )?;
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.admin.jwt_expires_in_hours as i64);
    state.store().create_admin_session(&SessionRecord {
        token_hash: hash_token(&token),
        admin_id: admin.id.clone(),
        created_at: now,
        expires_at,
        revoked: false,
    })?;

    let cookie = session_cookie(
        &token,
        config.admin.jwt_expires_in_hours * 3600,
        config.cookies.secure,
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        ok(LoginResponse {
            token,
            expires_at,
            admin: AdminProfile {
                id: admin.id,
                email: admin.email,
            },
        }),
    ))
}

async fn logout(
    session: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state.store().delete_admin_session(&session.token_hash)?;
    let cookie = expired_cookie(ADMIN_SESSION_COOKIE, state.config().cookies.secure);
    Ok((
        [(header::SET_COOKIE, cookie)],
        ok(serde_json::json!({ "loggedOut": true })),
    ))
}

async fn me(session: AdminSession, State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let admin = state
        .store()
        .get_admin_by_id(&session.admin_id)?
        .ok_or_else(|| AppError::unauthorized("Admin not found"))?;
    Ok(ok(AdminProfile {
        id: admin.id,
        email: admin.email,
    }))
}

/// `/signout`：撤销当前会话（若有），清除会话 cookie 并回到后台入口。
pub async fn signout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = extract_cookie(&headers, ADMIN_SESSION_COOKIE) {
        if let Err(e) = state.store().delete_admin_session(&hash_token(&token)) {
            tracing::warn!(error = %e, "Failed to revoke admin session on signout");
        }
    }

    let cookies = &state.config().cookies;
    let mut response = Redirect::to(ADMIN_PREFIX).into_response();
    for name in [ADMIN_SESSION_COOKIE, cookies.legacy_auth_cookie.as_str()] {
        if let Ok(value) = expired_cookie(name, cookies.secure).parse() {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
