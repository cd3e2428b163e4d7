/// 语言偏好 cookie 名称
pub const LOCALE_COOKIE: &str = "locale";

/// 语言 cookie 有效期（秒），约一年
pub const LOCALE_COOKIE_MAX_AGE_SECS: u64 = 31_536_000;

/// 前端构建产物的内部路径前缀
pub const INTERNAL_PREFIX: &str = "/_next";

pub const API_PREFIX: &str = "/api";

pub const STATIC_PREFIX: &str = "/static";

pub const ADMIN_PREFIX: &str = "/admin";

pub const ADMIN_LOGIN_PREFIX: &str = "/admin/login";

pub const SIGNOUT_PATH: &str = "/signout";

/// 后台会话 cookie 前缀
pub const DEFAULT_SESSION_COOKIE_PREFIX: &str = "sb-";

/// 旧版认证 cookie 名称
pub const DEFAULT_LEGACY_AUTH_COOKIE: &str = "supabase-auth-token";

/// 登录后写入的会话 cookie，名称以会话前缀开头
pub const ADMIN_SESSION_COOKIE: &str = "sb-access-token";

/// 上传文件的公开 URL 前缀
pub const UPLOADS_URL_PREFIX: &str = "/static/uploads";

/// 默认最大上传大小：5 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// 允许上传的图片扩展名
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif"];

/// 搜索关键字最大长度
pub const MAX_SEARCH_QUERY_LEN: usize = 200;

/// 批量操作单次最多处理的记录数
pub const MAX_BULK_IDS: usize = 500;
