//! Input normalisation helpers used by the domain validators.

use crate::error::{DomainError, DomainResult};

/// Trim `value` and reject it when empty.
pub fn required(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional value; blank strings become `None`.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Upper-case a short code and check it is 1..=10 chars of `[A-Z0-9]`.
pub fn code(field: &str, value: &str) -> DomainResult<String> {
    let normalized = value.trim().to_uppercase();
    if normalized.is_empty() || normalized.len() > 10 {
        return Err(DomainError::validation(format!(
            "{field} must have between 1 and 10 characters"
        )));
    }
    if !normalized.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err(DomainError::validation(format!(
            "{field} may only contain letters and digits"
        )));
    }
    Ok(normalized)
}

/// Minimal email shape check: one `@`, non-empty local part and domain.
pub fn email(value: Option<&str>) -> DomainResult<Option<String>> {
    let Some(email) = optional(value) else {
        return Ok(None);
    };
    let mut parts = email.split('@');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
    );
    if !valid {
        return Err(DomainError::validation("email is malformed"));
    }
    Ok(Some(email))
}
