//! Input validation for API requests.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Pragmatic email shape check; deliverability is the SMTP server's problem
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    /// Usernames: lowercase alphanumeric plus dots/underscores, 2-32 chars
    static ref USERNAME_REGEX: Regex =
        Regex::new(r"^[a-z0-9][a-z0-9._]{1,31}$").unwrap();

    /// Phone numbers: digits with optional leading + and separators
    static ref PHONE_REGEX: Regex =
        Regex::new(r"^\+?[0-9][0-9 \-]{5,19}$").unwrap();
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username must be 2-32 lowercase letters, digits, dots or underscores".to_string(),
        );
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.is_empty() {
        return Err("Phone is required".to_string());
    }
    if !PHONE_REGEX.is_match(phone) {
        return Err("Invalid phone number".to_string());
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    if name.len() > 100 {
        return Err("Name is too long (max 100 characters)".to_string());
    }
    Ok(())
}

/// Validate password strength.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err("Password must contain at least one letter and one digit".to_string());
    }
    Ok(())
}

pub fn validate_required(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_emails() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@shop.example.co").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("spaces in@x.com").is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("a1").is_ok());
        assert!(validate_username("jane.doe_99").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("X").is_err());
        assert!(validate_username("UPPER").is_err());
    }

    #[test]
    fn phone_rules() {
        assert!(validate_phone("0700000000").is_ok());
        assert!(validate_phone("+233 24 000 0000").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("abc").is_err());
    }

    #[test]
    fn password_strength() {
        assert!(validate_password("Aa1!aaaa").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("alllettersonly").is_err());
        assert!(validate_password("12345678").is_err());
    }
}
