pub const NEWS: &str = "news";
pub const ACHIEVEMENTS: &str = "achievements";
pub const TEACHERS: &str = "teachers";
pub const COURSES: &str = "courses";
pub const CONTACT_MESSAGES: &str = "contact_messages";

pub const ADMINS: &str = "admins";
pub const ADMIN_SESSIONS: &str = "admin_sessions";
pub const META: &str = "meta";
