use crate::utils::error::{QuoteError, Result};
use std::collections::HashMap;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(QuoteError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(QuoteError::InvalidConfigValue {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(QuoteError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(QuoteError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(QuoteError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| QuoteError::MissingConfig {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(QuoteError::MissingConfig {
            field: field_name.to_string(),
        });
    }
    Ok(())
}

/// `name` must be usable as exactly one directory under the output root.
pub fn validate_path_component(field_name: &str, value: &str, name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("folder name is empty")
    } else if name == "." || name == ".." {
        Some("folder name refers to a relative directory")
    } else if name.contains(['/', '\\', '\0']) {
        Some("folder name contains a path separator")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(QuoteError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("{} ({:?})", reason, name),
        }),
        None => Ok(()),
    }
}

/// Fails unless `key` is present in the replacement input.
pub fn validate_required_key(map: &HashMap<String, String>, key: &str) -> Result<()> {
    if !map.contains_key(key) {
        return Err(QuoteError::MissingConfig {
            field: key.to_string(),
        });
    }
    Ok(())
}
