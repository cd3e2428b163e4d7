use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::ADMIN_SESSION_COOKIE;
use crate::content::Access;
use crate::response::AppError;
use crate::state::AppState;

const ADMIN_TOKEN_TYPE: &str = "admin";

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|v| v.to_string())
        .map_err(|e| AppError::internal(&format!("password hash failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(&format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// 邮箱不存在时用于校验的占位哈希，使响应耗时与真实校验一致
pub fn dummy_password_hash() -> &'static str {
    "$argon2id$v=19$m=19456,t=2,p=1$ZHVtbXlzYWx0ZHVtbXk$YWJjZGVmZ2hpamtsbW5vcHFyc3R1dnd4eXoxMjM0NTY"
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub jti: String,
}

pub fn sign_admin_jwt(admin_id: &str, secret: &str, expires_in_hours: u64) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: admin_id.to_string(),
        token_type: ADMIN_TOKEN_TYPE.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(expires_in_hours as i64)).timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(&format!("jwt sign failed: {e}")))
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.algorithms = vec![Algorithm::HS256];

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth_header| auth_header.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Value of cookie `name`, searched across every `Cookie` header.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}

pub fn extract_admin_token(headers: &HeaderMap) -> Result<String, AppError> {
    extract_bearer_token(headers)
        .or_else(|| extract_cookie(headers, ADMIN_SESSION_COOKIE))
        .ok_or_else(|| AppError::unauthorized("Missing admin token"))
}

pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{ADMIN_SESSION_COOKIE}={token}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Expires cookie `name`; used on logout and `/signout`.
pub fn expired_cookie(name: &str, secure: bool) -> String {
    let mut cookie = format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// 已验证的管理员会话。只有持有它的请求才能以特权方式访问存储。
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin_id: String,
    pub token_hash: String,
}

impl AdminSession {
    pub fn access(&self) -> Access {
        Access::Privileged
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = extract_admin_token(&parts.headers)?;
        let claims = verify_jwt(&token, &app_state.config().admin.jwt_secret)?;

        if claims.token_type != ADMIN_TOKEN_TYPE {
            return Err(AppError::unauthorized("Invalid token type"));
        }

        let token_hash = hash_token(&token);
        let session = app_state
            .store()
            .get_admin_session(&token_hash)?
            .ok_or_else(|| AppError::unauthorized("Admin session not found or expired"))?;

        if session.admin_id != claims.sub {
            return Err(AppError::unauthorized("Admin session mismatch"));
        }

        Ok(AdminSession {
            admin_id: claims.sub,
            token_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn password_hash_and_verify() {
        let hash = hash_password("Passw0rd!").unwrap();
        assert!(verify_password("Passw0rd!", &hash).unwrap());
        assert!(!verify_password("bad", &hash).unwrap());
        assert!(!verify_password("anything", dummy_password_hash()).unwrap());
    }

    #[test]
    fn jwt_sign_and_verify() {
        let token = sign_admin_jwt("a1", "secret", 1).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, "a1");
        assert_eq!(claims.token_type, "admin");
        assert!(verify_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn token_prefers_bearer_then_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("locale=bg"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sb-access-token=from-cookie"),
        );
        assert_eq!(extract_admin_token(&headers).unwrap(), "from-cookie");

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_admin_token(&headers).unwrap(), "from-header");
    }

    #[test]
    fn missing_token_is_unauthorized() {
        let err = extract_admin_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("tok", 3600, true);
        assert!(cookie.starts_with("sb-access-token=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("; Secure"));
        assert!(expired_cookie("sb-access-token", false).contains("Max-Age=0"));
    }

    #[test]
    fn token_hash_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }
}
