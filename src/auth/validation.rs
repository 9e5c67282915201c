use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{3,50}$").unwrap();
}

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 100;
pub const FULL_NAME_MAX_LEN: usize = 100;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 255 && EMAIL_RE.is_match(email)
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Username must be 3-50 characters of letters, numbers, hyphens and underscores"
                .into(),
        ))
    }
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at most {PASSWORD_MAX_LEN} characters"
        )));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(AppError::Validation(
            "Password must contain at least one uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(AppError::Validation(
            "Password must contain at least one lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_numeric()) {
        return Err(AppError::Validation(
            "Password must contain at least one digit".into(),
        ));
    }
    Ok(())
}

pub fn validate_full_name(full_name: Option<&str>) -> Result<(), AppError> {
    match full_name {
        Some(name) if name.chars().count() > FULL_NAME_MAX_LEN => Err(AppError::Validation(
            format!("Full name must be at most {FULL_NAME_MAX_LEN} characters"),
        )),
        _ => Ok(()),
    }
}
