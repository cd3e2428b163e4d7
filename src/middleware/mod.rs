pub mod locale;
pub mod request_id;
