//! Field validation rules shared by entity inputs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

/// Entity-specific field constraint violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    Blank(&'static str),
    /// Text field exceeds its maximum character count.
    TooLong { field: &'static str, max: usize },
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
    /// Plaintext password is shorter than the minimum.
    PasswordTooShort { min: usize },
    /// Another user already owns this username.
    DuplicateUsername(String),
    /// Another user already owns this email.
    DuplicateEmail(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank(field) => write!(f, "{field} must not be blank"),
            Self::TooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::DuplicateUsername(value) => write!(f, "username already taken: {value}"),
            Self::DuplicateEmail(value) => write!(f, "email already registered: {value}"),
        }
    }
}

impl Error for ValidationError {}

/// Trims `value` and checks it is non-empty and at most `max` characters.
pub fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank(field));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

/// Trims and checks an email address.
pub fn email(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank("email"));
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidEmail(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Checks the plaintext password length. Passwords are not trimmed.
pub fn password(value: &str, min: usize) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        return Err(ValidationError::PasswordTooShort { min });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{email, password, required_text, ValidationError};

    #[test]
    fn required_text_trims_and_bounds() {
        assert_eq!(required_text("name", "  Docs ", 50).unwrap(), "Docs");
        assert_eq!(
            required_text("name", "   ", 50).unwrap_err(),
            ValidationError::Blank("name")
        );
        assert_eq!(
            required_text("name", &"é".repeat(51), 50).unwrap_err(),
            ValidationError::TooLong {
                field: "name",
                max: 50
            }
        );
        assert!(required_text("name", &"é".repeat(50), 50).is_ok());
    }

    #[test]
    fn email_requires_domain_with_dot() {
        assert_eq!(email(" admin@example.com ").unwrap(), "admin@example.com");
        assert!(matches!(
            email("admin@localhost"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            email("no spaces@example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn password_counts_characters() {
        assert!(password("secret", 6).is_ok());
        assert_eq!(
            password("short", 6).unwrap_err(),
            ValidationError::PasswordTooShort { min: 6 }
        );
    }
}
