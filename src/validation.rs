//! 输入校验：管理员凭据、联系表单、上传文件名。

use crate::constants::{IMAGE_EXTENSIONS, MAX_SEARCH_QUERY_LEN};

const MAX_NAME_CHARS: usize = 120;
const MAX_SUBJECT_CHARS: usize = 200;
const MAX_MESSAGE_CHARS: usize = 5000;
const MAX_PHONE_CHARS: usize = 32;
const MAX_FILENAME_CHARS: usize = 128;

/// 管理员密码：8 到 256 字节，需包含字母和数字
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if password.len() > 256 {
        return Err("Password must be at most 256 characters");
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err("Password must contain a letter and a digit");
    }
    Ok(())
}

/// user@domain.tld，local 部分只允许 ASCII 字母数字与 `._+-`
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local.len() <= 64
        && local
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'+' | b'-'))
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..");
    if !local_ok || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

fn required(value: &str, field: &'static str, max_chars: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} is required"));
    }
    if trimmed.chars().count() > max_chars {
        return Err(format!("{field} must be at most {max_chars} characters"));
    }
    Ok(())
}

/// Checks a public contact form submission.
pub fn validate_contact(
    name: &str,
    email: &str,
    phone: Option<&str>,
    subject: &str,
    message: &str,
) -> Result<(), String> {
    required(name, "name", MAX_NAME_CHARS)?;
    if !is_valid_email(email.trim()) {
        return Err("email is invalid".to_string());
    }
    if let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) {
        let phone_ok = phone.chars().count() <= MAX_PHONE_CHARS
            && phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
        if !phone_ok {
            return Err("phone is invalid".to_string());
        }
    }
    if subject.trim().chars().count() > MAX_SUBJECT_CHARS {
        return Err(format!("subject must be at most {MAX_SUBJECT_CHARS} characters"));
    }
    required(message, "message", MAX_MESSAGE_CHARS)
}

/// 校验上传文件名并返回小写扩展名。文件名不能带路径分隔符。
pub fn validate_image_filename(filename: &str) -> Result<String, &'static str> {
    let filename = filename.trim();
    if filename.is_empty() || filename.chars().count() > MAX_FILENAME_CHARS {
        return Err("Invalid file name");
    }
    if filename.contains(['/', '\\']) || filename.starts_with('.') {
        return Err("Invalid file name");
    }
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or("File name has no extension")?;
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err("Only image uploads are allowed");
    }
    Ok(extension)
}

/// 截断过长的搜索关键字
pub fn normalize_search(query: &str) -> String {
    query.trim().chars().take(MAX_SEARCH_QUERY_LEN).collect()
}
