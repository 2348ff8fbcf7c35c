//! Input checks shared by the account and calendar endpoints.

use validator::ValidateEmail;

use crate::error::CoreError;
use crate::types::Timestamp;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Syntax check from `validator`, plus a dotted domain.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let email = email.trim();
    let dotted_domain = email
        .rsplit_once('@')
        .is_some_and(|(_, domain)| domain.contains('.') && !domain.ends_with('.'));
    if dotted_domain && email.validate_email() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("Invalid email address '{email}'")))
    }
}

pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Trimmed value of a required text field.
pub fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Calendar entries must end after they start.
pub fn validate_time_range(start: Timestamp, end: Timestamp) -> Result<(), CoreError> {
    if end <= start {
        return Err(CoreError::validation("end must be after start"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn emails() {
        assert!(validate_email("tecnico@gemelli.edu.co").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("two@@x.co").is_err());
    }

    #[test]
    fn password_length_counts_chars() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("ñandú1").is_ok());
    }

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(require_text("title", "  Fuga  ").unwrap(), "Fuga");
        assert!(require_text("title", "   ").is_err());
    }

    #[test]
    fn time_range_must_be_positive() {
        let now = Utc::now();
        assert!(validate_time_range(now, now + Duration::hours(1)).is_ok());
        assert!(validate_time_range(now, now).is_err());
    }
}
