use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Signs an access/refresh pair for `user_id`.
pub(crate) fn issue_tokens(keys: &JwtKeys, user_id: Uuid) -> anyhow::Result<(String, String)> {
    Ok((keys.sign_access(user_id)?, keys.sign_refresh(user_id)?))
}
