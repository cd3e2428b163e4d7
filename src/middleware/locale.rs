use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::constants::{
    ADMIN_LOGIN_PREFIX, ADMIN_PREFIX, API_PREFIX, INTERNAL_PREFIX, LOCALE_COOKIE,
    LOCALE_COOKIE_MAX_AGE_SECS, SIGNOUT_PATH, STATIC_PREFIX,
};
use crate::i18n::Locale;
use crate::state::AppState;

/// 请求路径的分类，每个路径恰好属于其中一类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    InternalFramework,
    Api,
    StaticAsset,
    LocalePrefixed(Locale),
    Admin,
    Signout,
    Root,
    UnprefixedPublic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    PassThrough,
    Redirect(String),
}

/// Outcome of routing one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub kind: PathKind,
    pub action: RouteAction,
    /// Locale cookie to write on the response, if any.
    pub locale_cookie: Option<Locale>,
}

impl RouteDecision {
    fn pass(kind: PathKind) -> Self {
        Self {
            kind,
            action: RouteAction::PassThrough,
            locale_cookie: None,
        }
    }

    fn redirect(kind: PathKind, location: String, locale_cookie: Option<Locale>) -> Self {
        Self {
            kind,
            action: RouteAction::Redirect(location),
            locale_cookie,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.action, RouteAction::Redirect(_))
    }
}

/// 路由规则所需的配置：内部前缀与后台会话 cookie 约定。
#[derive(Debug, Clone)]
pub struct LocaleRouter {
    internal_prefix: String,
    session_cookie_prefix: String,
    legacy_auth_cookie: String,
}

impl Default for LocaleRouter {
    fn default() -> Self {
        Self::new(
            INTERNAL_PREFIX,
            crate::constants::DEFAULT_SESSION_COOKIE_PREFIX,
            crate::constants::DEFAULT_LEGACY_AUTH_COOKIE,
        )
    }
}

impl LocaleRouter {
    pub fn new(internal_prefix: &str, session_cookie_prefix: &str, legacy_auth_cookie: &str) -> Self {
        Self {
            internal_prefix: internal_prefix.to_string(),
            session_cookie_prefix: session_cookie_prefix.to_string(),
            legacy_auth_cookie: legacy_auth_cookie.to_string(),
        }
    }

    /// 纯函数分类，规则按顺序匹配，先命中者生效。
    pub fn classify(&self, path: &str) -> PathKind {
        if path.starts_with(&self.internal_prefix) {
            return PathKind::InternalFramework;
        }
        if path.starts_with(API_PREFIX) {
            return PathKind::Api;
        }
        if path.starts_with(STATIC_PREFIX) || last_segment_has_extension(path) {
            return PathKind::StaticAsset;
        }

        let first = first_segment(path);
        if let Some(locale) = first.and_then(Locale::parse) {
            return PathKind::LocalePrefixed(locale);
        }
        if path.starts_with(ADMIN_PREFIX) {
            return PathKind::Admin;
        }
        if path == SIGNOUT_PATH {
            return PathKind::Signout;
        }
        if path == "/" {
            return PathKind::Root;
        }
        PathKind::UnprefixedPublic
    }

    /// Decides what to do with a request for `path` carrying cookies named `cookie_names`.
    pub fn route<'a, I>(&self, path: &str, cookie_names: I) -> RouteDecision
    where
        I: IntoIterator<Item = &'a str>,
    {
        let kind = self.classify(path);
        match kind {
            PathKind::InternalFramework | PathKind::Api | PathKind::StaticAsset => {
                RouteDecision::pass(kind)
            }
            PathKind::LocalePrefixed(locale) if !locale.is_default() => {
                let location = rewrite_locale_segment(path, Locale::DEFAULT);
                RouteDecision::redirect(kind, location, Some(Locale::DEFAULT))
            }
            PathKind::Admin => {
                if path == ADMIN_PREFIX
                    || path.starts_with(ADMIN_LOGIN_PREFIX)
                    || self.has_session_cookie(cookie_names)
                {
                    RouteDecision::pass(kind)
                } else {
                    RouteDecision::redirect(kind, ADMIN_PREFIX.to_string(), None)
                }
            }
            PathKind::Signout => RouteDecision::pass(kind),
            PathKind::UnprefixedPublic => RouteDecision::redirect(
                kind,
                format!("/{}{}", Locale::DEFAULT.code(), path),
                Some(Locale::DEFAULT),
            ),
            PathKind::Root => RouteDecision::redirect(
                kind,
                format!("/{}", Locale::DEFAULT.code()),
                Some(Locale::DEFAULT),
            ),
            PathKind::LocalePrefixed(locale) => RouteDecision {
                kind,
                action: RouteAction::PassThrough,
                locale_cookie: Some(locale),
            },
        }
    }

    /// 仅检查 cookie 是否存在，不校验内容；真正的鉴权在 API 层完成。
    fn has_session_cookie<'a, I>(&self, cookie_names: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        cookie_names.into_iter().any(|name| {
            name.starts_with(&self.session_cookie_prefix) || name == self.legacy_auth_cookie
        })
    }
}

fn first_segment(path: &str) -> Option<&str> {
    path.split('/').find(|segment| !segment.is_empty())
}

fn last_segment_has_extension(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|last| last.contains('.'))
}

fn rewrite_locale_segment(path: &str, locale: Locale) -> String {
    let rest: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .skip(1)
        .collect();
    if rest.is_empty() {
        format!("/{}", locale.code())
    } else {
        format!("/{}/{}", locale.code(), rest.join("/"))
    }
}

/// 写回 Location 时需要重新转义的路径字符
const LOCATION_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-decoded request path; invalid UTF-8 sequences become U+FFFD.
pub fn decoded_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

pub fn locale_cookie_header(locale: Locale) -> String {
    format!(
        "{LOCALE_COOKIE}={}; Path=/; Max-Age={LOCALE_COOKIE_MAX_AGE_SECS}; SameSite=Lax",
        locale.code()
    )
}

/// Names of all cookies on the request, across every `Cookie` header.
pub fn request_cookie_names(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| {
            let name = pair.split('=').next().unwrap_or("").trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

pub async fn locale_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = decoded_path(req.uri().path());
    let cookie_names = request_cookie_names(req.headers());
    let decision = state
        .locale_router()
        .route(&path, cookie_names.iter().map(String::as_str));

    match decision.action {
        RouteAction::PassThrough => {
            let mut response = next.run(req).await;
            if let Some(locale) = decision.locale_cookie {
                append_locale_cookie(&mut response, locale);
            }
            response
        }
        RouteAction::Redirect(location) => {
            let mut location = utf8_percent_encode(&location, LOCATION_PATH).to_string();
            if decision.locale_cookie.is_some() {
                if let Some(query) = req.uri().query() {
                    location.push('?');
                    location.push_str(query);
                }
            }
            let Ok(location_value) = HeaderValue::from_str(&location) else {
                tracing::warn!(path = %path, location = %location, "Unencodable redirect target, passing through");
                return next.run(req).await;
            };

            tracing::debug!(path = %path, kind = ?decision.kind, location = %location, "locale redirect");
            let mut response = (
                StatusCode::TEMPORARY_REDIRECT,
                [(header::LOCATION, location_value)],
            )
                .into_response();
            if let Some(locale) = decision.locale_cookie {
                append_locale_cookie(&mut response, locale);
            }
            response
        }
    }
}

fn append_locale_cookie(response: &mut Response, locale: Locale) {
    if let Ok(value) = HeaderValue::from_str(&locale_cookie_header(locale)) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}
