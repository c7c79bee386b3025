//! Field-level input validation shared by checkout and contact intake.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum number of phone characters after an optional leading `+`.
pub const MIN_PHONE_CHARS: usize = 10;

/// A validation failure on one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as it appears in the request.
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

/// Collected validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Whether any failure was recorded for `field`.
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Check an email address of the form `local@domain.tld` with no whitespace.
///
/// ```
/// use storefront_commerce::validation::is_valid_email;
/// assert!(is_valid_email("ivan@example.ru"));
/// assert!(!is_valid_email("ivan@example"));
/// ```
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain needs a dot with at least one character on each side.
    let chars: Vec<char> = domain.chars().collect();
    chars.len() >= 3
        && chars[1..chars.len() - 1].contains(&'.')
}

/// Check a phone number loosely: an optional leading `+`, then at least ten
/// characters drawn from digits, whitespace, `-`, `(` and `)`.
///
/// ```
/// use storefront_commerce::validation::is_valid_phone;
/// assert!(is_valid_phone("+7 (495) 123-45-67"));
/// assert!(!is_valid_phone("12345"));
/// ```
pub fn is_valid_phone(phone: &str) -> bool {
    let body = phone.strip_prefix('+').unwrap_or(phone);
    body.chars().count() >= MIN_PHONE_CHARS
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '(' | ')'))
}

/// Trim a required field, returning an empty string when absent.
pub(crate) fn required(value: &str) -> String {
    value.trim().to_string()
}

/// Trim an optional field; blank values become `None`.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("sales.team@shop.example.ru"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.ru"));
        assert!(!is_valid_email("@example.ru"));
        assert!(!is_valid_email("a@.ru"));
        assert!(!is_valid_email("a@ru."));
        assert!(!is_valid_email("a b@example.ru"));
        assert!(!is_valid_email("a@b@example.ru"));
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("89161234567"));
        assert!(is_valid_phone("+7 916 123-45-67"));
        assert!(is_valid_phone("(495) 1234567"));
        assert!(!is_valid_phone("+7916"));
        assert!(!is_valid_phone("+7 916 123 45 6x"));
        assert!(!is_valid_phone("++79161234567"));
    }

    #[test]
    fn test_optional_trimming() {
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" ACME ")), Some("ACME".to_string()));
        assert_eq!(optional(None), None);
    }

    #[test]
    fn test_errors_display() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "Name is required");
        errors.add("phone", "Invalid phone number");
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "name: Name is required; phone: Invalid phone number"
        );
        assert!(errors.into_result().is_err());
    }
}
