use regex::Regex;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("empty zone or label")]
    Empty,
    #[error("label too long (max 63 characters)")]
    TooLong,
    #[error("label contains invalid characters (only a-z, 0-9, '-' and '_' allowed)")]
    InvalidCharacters,
    #[error("label must not start or end with '-'")]
    LeadingOrTrailingHyphen,
    #[error("URL must start with http:// or https://")]
    InvalidScheme,
}

lazy_static::lazy_static! {
    /// Letters, digits, '-' and '_' (zones are matched case-insensitively)
    static ref LABEL_RE: Regex = Regex::new(r"(?i)^[a-z0-9_-]+$").unwrap();
}

pub fn validate_label(label: &str) -> Result<(), ValidationError> {
    if label.is_empty() {
        return Err(ValidationError::Empty);
    }
    if label.len() > 63 {
        return Err(ValidationError::TooLong);
    }
    if !LABEL_RE.is_match(label) {
        return Err(ValidationError::InvalidCharacters);
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(ValidationError::LeadingOrTrailingHyphen);
    }

    Ok(())
}

/// Accepts `example.com` or `example.com.`.
pub fn validate_zone(zone: &str) -> Result<(), ValidationError> {
    let z = zone.trim_end_matches('.');
    if z.is_empty() {
        return Err(ValidationError::Empty);
    }
    for label in z.split('.') {
        validate_label(label)?;
    }
    Ok(())
}

pub fn validate_cpanel_url(url: &str) -> Result<(), ValidationError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or(ValidationError::InvalidScheme)?;
    if rest.trim_end_matches('/').is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(())
}
