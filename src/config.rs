use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::constants::{
    DEFAULT_LEGACY_AUTH_COOKIE, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_SESSION_COOKIE_PREFIX,
};

const DEFAULT_ADMIN_JWT_SECRET: &str = "change_me_to_another_random_64_chars_change_me_to_another";

/// HS256 密钥的最小长度
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub cors_origin: String,
    pub admin: AdminAuthConfig,
    pub cookies: CookieConfig,
    pub media: MediaConfig,
}

#[derive(Clone)]
pub struct AdminAuthConfig {
    pub jwt_secret: String,
    pub jwt_expires_in_hours: u64,
}

impl fmt::Debug for AdminAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAuthConfig")
            .field("jwt_secret", &"***REDACTED***")
            .field("jwt_expires_in_hours", &self.jwt_expires_in_hours)
            .finish()
    }
}

/// 会话 cookie 相关配置，locale 路由与管理员登录共用
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub session_prefix: String,
    pub legacy_auth_cookie: String,
    pub secure: bool,
}

/// 上传目录、前端构建目录与上传大小限制
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub upload_dir: String,
    pub static_dir: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/school.sled"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:3000"),
            admin: AdminAuthConfig {
                jwt_secret: env_or("ADMIN_JWT_SECRET", DEFAULT_ADMIN_JWT_SECRET),
                jwt_expires_in_hours: env_or_parse("ADMIN_JWT_EXPIRES_IN_HOURS", 12_u64).max(1),
            },
            cookies: CookieConfig {
                session_prefix: env_or("SESSION_COOKIE_PREFIX", DEFAULT_SESSION_COOKIE_PREFIX),
                legacy_auth_cookie: env_or("LEGACY_AUTH_COOKIE", DEFAULT_LEGACY_AUTH_COOKIE),
                secure: env_or_bool("SECURE_COOKIES", false),
            },
            media: MediaConfig {
                upload_dir: env_or("UPLOAD_DIR", "./data/uploads"),
                static_dir: env_or("STATIC_DIR", "./public"),
                max_upload_bytes: env_or_parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            },
        }
    }

    /// 启动时需要提示运维的不安全配置
    pub fn startup_warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.admin.jwt_secret == DEFAULT_ADMIN_JWT_SECRET {
            warnings.push("ADMIN_JWT_SECRET is the built-in default");
        } else if self.admin.jwt_secret.len() < MIN_SECRET_LEN {
            warnings.push("ADMIN_JWT_SECRET is shorter than 32 characters");
        }
        if !self.cookies.secure && !self.cors_origin.contains("localhost") {
            warnings.push("SECURE_COOKIES is off for a non-local origin");
        }
        if !self.cookies.session_prefix.is_empty()
            && !crate::constants::ADMIN_SESSION_COOKIE.starts_with(&self.cookies.session_prefix)
        {
            warnings.push("SESSION_COOKIE_PREFIX does not match the admin session cookie");
        }
        warnings
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
