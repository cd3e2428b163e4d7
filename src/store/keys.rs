pub fn content_key(record_id: &str) -> String {
    record_id.to_string()
}

pub fn admin_key(admin_id: &str) -> String {
    admin_id.to_string()
}

pub fn admin_email_index_key(email: &str) -> String {
    format!("email:{}", email.trim().to_lowercase())
}

pub fn admin_session_key(token_hash: &str) -> String {
    token_hash.to_string()
}

pub fn admin_session_index_key(admin_id: &str, token_hash: &str) -> String {
    format!("admin:{}:{}", admin_id, token_hash)
}

pub fn admin_session_index_prefix(admin_id: &str) -> String {
    format!("admin:{}:", admin_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_index_is_normalized() {
        assert_eq!(admin_email_index_key(" A@Ex.com "), "email:a@ex.com");
    }

    #[test]
    fn session_index_shares_prefix() {
        let key = admin_session_index_key("a1", "h1");
        assert!(key.starts_with(&admin_session_index_prefix("a1")));
    }
}
