use crate::domain::email::domain;
use crate::domain::model::ReplacementSet;
use crate::domain::phone::normalize_tel;
use crate::domain::ports::{CountryLookup, EmailClassifier};
use crate::utils::error::{QuoteError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

pub const EMAIL_KEY: &str = "{{email}}";
pub const QUOTE_KEY: &str = "{{quote}}";

const DATE_FORMAT: &str = "%b %-d, %Y";
const QUOTE_VALIDITY_DAYS: i64 = 30;

/// `ContactName` becomes `{{contact-name}}`; already wrapped keys are kept.
pub fn placeholder_key(raw: &str) -> String {
    if raw.starts_with("{{") && raw.ends_with("}}") && raw.len() >= 4 {
        return raw.to_string();
    }
    let name = raw.trim_matches(|c| c == '{' || c == '}');
    format!("{{{{{}}}}}", dasherize(name))
}

/// Lower-case words joined by `-`. Words split on non-alphanumerics, on a
/// lower-to-upper transition, and before the last capital of an acronym
/// run (`HTTPServer` -> `http-server`).
pub fn dasherize(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.join("-")
}

pub fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Builds the replacement set for one run from raw `--data` input.
pub fn normalize(
    raw: &HashMap<String, String>,
    now: DateTime<Utc>,
    classifier: &dyn EmailClassifier,
    lookup: &dyn CountryLookup,
) -> Result<ReplacementSet> {
    let mut replacements = ReplacementSet::new();
    let mut entries: Vec<(&String, &String)> = raw.iter().collect();
    entries.sort();
    for (key, value) in entries {
        let placeholder = placeholder_key(key);
        if replacements.contains(&placeholder) {
            return Err(QuoteError::InvalidConfigValue {
                field: placeholder,
                value: key.clone(),
                reason: "more than one input key fills this placeholder".to_string(),
            });
        }
        replacements.insert(placeholder, value.clone());
    }

    let email = replacements
        .get(EMAIL_KEY)
        .map(str::to_string)
        .ok_or_else(|| QuoteError::MissingConfig {
            field: EMAIL_KEY.to_string(),
        })?;

    let website = if classifier.is_public(&email) {
        String::new()
    } else {
        domain(&email)
    };
    replacements.insert("{{website}}", website);

    if !replacements.contains("{{tel}}") {
        if let Some(phone) = replacements.get("{{phone}}").map(str::to_string) {
            replacements.insert("{{tel}}", phone);
        }
    }

    if let Some(raw_tel) = replacements.get("{{tel}}").map(str::to_string) {
        let tel = normalize_tel(&raw_tel);
        match lookup.country(&tel) {
            Some(country) => replacements.insert("{{country}}", country),
            None => tracing::debug!("No country found for telephone {}", tel),
        }
        replacements.insert("{{tel}}", tel);
    }

    replacements.insert("{{prep-date}}", format_date(now));
    replacements.insert(
        "{{expiry-date}}",
        format_date(now + Duration::days(QUOTE_VALIDITY_DAYS)),
    );

    Ok(replacements)
}
