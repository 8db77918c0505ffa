//! Input checks shared by services.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{AidenError, Result};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .unwrap_or_else(|e| unreachable!("static email pattern: {e}"))
});

pub const MAX_EMAIL_LEN: usize = 255;

/// Lower-case and trim an email address.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(candidate: &str) -> bool {
    candidate.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(candidate)
}

pub fn email(field: &str, value: &str) -> Result<String> {
    let normalized = normalize_email(value);
    if normalized.is_empty() {
        return Err(AidenError::Validation(format!("{field} is required")));
    }
    if !is_valid_email(&normalized) {
        return Err(AidenError::Validation(format!(
            "{field} must be a valid email address"
        )));
    }
    Ok(normalized)
}

/// Trimmed, non-empty, at most `max` characters.
pub fn required(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AidenError::Validation(format!("{field} is required")));
    }
    max_len(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

/// Blank strings collapse to `None`.
pub fn optional(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            max_len(field, trimmed, max)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

pub fn optional_url(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>> {
    let Some(candidate) = optional(field, value, max)? else {
        return Ok(None);
    };
    match Url::parse(&candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(Some(candidate))
        }
        _ => Err(AidenError::Validation(format!(
            "{field} must be a valid URL"
        ))),
    }
}

fn max_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(AidenError::Validation(format!(
            "{field} must not exceed {max} characters"
        )));
    }
    Ok(())
}
