pub mod admins;
pub mod content;
pub mod sessions;
