//! Input validation utilities
//!
//! Validators collect every problem per field instead of stopping at the first
//! one, so a form can be re-rendered with all messages at once.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{DomainError, DomainResult};

/// Field name -> messages, serialized as a JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error
    pub fn into_result(self) -> DomainResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

/// Body returned for recoverable action failures
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionFailure {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_data: Option<serde_json::Value>,
}

impl ActionFailure {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            errors: FieldErrors::default(),
            submitted_data: None,
        }
    }

    pub fn fields(errors: FieldErrors) -> Self {
        Self {
            success: false,
            message: None,
            errors,
            submitted_data: None,
        }
    }

    /// Attach the values to re-display; callers must leave passwords out
    pub fn with_submitted(mut self, data: serde_json::Value) -> Self {
        self.submitted_data = Some(data);
        self
    }
}

/// Require at least `min` characters after trimming
pub fn check_min_length(errors: &mut FieldErrors, field: &str, label: &str, value: &str, min: usize) {
    if value.trim().chars().count() < min {
        errors.add(
            field,
            format!("The {label} must be at least {min} characters long."),
        );
    }
}

/// Canonical form of an email for storage, lookup and throttling
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email
pub fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.add("email", "Email is required");
        return;
    }

    if email.len() > 254 {
        errors.add("email", "Email must be at most 254 characters long");
        return;
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        errors.add("email", "Invalid email format");
    }
}

/// Validate a new password and its confirmation
pub fn check_password(errors: &mut FieldErrors, password: &str, confirmation: &str) {
    if password.chars().count() < 6 {
        errors.add("password", "Password must be at least 6 characters long");
    } else if password.len() > 128 {
        errors.add("password", "Password must be at most 128 characters long");
    } else {
        let has_letter = password.chars().any(|c| c.is_alphabetic());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());

        if !has_letter || !has_digit {
            errors.add(
                "password",
                "Password must contain at least one letter and one digit",
            );
        }
    }

    if password != confirmation {
        errors.add("passwordConfirmation", "Passwords do not match");
    }
}

/// Fields shared by registration and admin user creation
pub fn validate_new_user(
    email: &str,
    name: &str,
    password: &str,
    confirmation: &str,
) -> DomainResult<()> {
    let mut errors = FieldErrors::default();
    check_email(&mut errors, email);
    check_min_length(&mut errors, "name", "name", name, 2);
    check_password(&mut errors, password, confirmation);
    errors.into_result()
}

pub fn validate_facility(name: &str, kind: &str, location: &str) -> DomainResult<()> {
    let mut errors = FieldErrors::default();
    check_min_length(&mut errors, "name", "name", name, 3);
    check_min_length(&mut errors, "type", "type", kind, 3);
    check_min_length(&mut errors, "location", "location", location, 3);
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_errors(result: DomainResult<()>) -> FieldErrors {
        match result {
            Err(DomainError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_seed_style_credentials() {
        assert!(validate_new_user("user@user.com", "User user", "User123", "User123").is_ok());
    }

    #[test]
    fn reports_every_failing_field() {
        let errors = field_errors(validate_new_user("not-an-email", "x", "short", "other"));

        assert_eq!(errors.get("email"), Some(&["Invalid email format".to_string()][..]));
        assert!(errors.get("name").is_some());
        assert!(errors.get("password").is_some());
        assert_eq!(
            errors.get("passwordConfirmation"),
            Some(&["Passwords do not match".to_string()][..])
        );
    }

    #[test]
    fn emails_normalize_to_trimmed_lowercase() {
        assert_eq!(normalize_email("  Ann.Lee@Example.COM "), "ann.lee@example.com");
        assert_eq!(normalize_email("a@b.io"), "a@b.io");
    }

    #[test]
    fn password_needs_letters_and_digits() {
        let errors = field_errors(validate_new_user("a@b.io", "Ann", "abcdefgh", "abcdefgh"));
        assert_eq!(errors.get("password").map(<[String]>::len), Some(1));
        assert!(errors.get("passwordConfirmation").is_none());
    }

    #[test]
    fn facility_fields_need_three_characters() {
        assert!(validate_facility("Gym A", "Gym", "City 1").is_ok());

        let errors = field_errors(validate_facility("Gy", "Gym", "  ab  "));
        assert_eq!(
            errors.get("name"),
            Some(&["The name must be at least 3 characters long.".to_string()][..])
        );
        assert!(errors.get("type").is_none());
        assert!(errors.get("location").is_some());
    }

    #[test]
    fn action_failure_omits_empty_parts() {
        let body = serde_json::to_value(ActionFailure::message("nope")).unwrap();
        assert_eq!(body, serde_json::json!({"success": false, "message": "nope"}));

        let mut errors = FieldErrors::default();
        errors.add("email", "Email is required");
        let body = serde_json::to_value(
            ActionFailure::fields(errors).with_submitted(serde_json::json!({"email": ""})),
        )
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "errors": {"email": ["Email is required"]},
                "submittedData": {"email": ""}
            })
        );
    }
}
