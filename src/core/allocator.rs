use crate::domain::model::{QuoteIdentifier, QUOTE_PREFIX};
use crate::utils::error::{QuoteError, QuoteField, Result};
use chrono::{DateTime, Datelike, Utc};

/// Next quotation identifier after `last` for the month containing `now`.
///
/// A missing or foreign (non `AC`) previous value starts the month at 001.
pub fn allocate(last: Option<&str>, now: DateTime<Utc>) -> Result<QuoteIdentifier> {
    let year = now.year().rem_euclid(100) as u32;
    let month = now.month();

    let last = match last {
        Some(value) if value.starts_with(QUOTE_PREFIX) => value,
        _ => return Ok(QuoteIdentifier::new(year, month, 1)),
    };

    let previous = parse(last)?;
    if previous.year == year && previous.month == month {
        let serial = previous
            .serial
            .checked_add(1)
            .ok_or_else(|| format_error(QuoteField::Serial, last))?;
        Ok(QuoteIdentifier::new(year, month, serial))
    } else {
        Ok(QuoteIdentifier::new(year, month, 1))
    }
}

/// Parses a recorded `ACYYMMSSS` identifier.
pub fn parse(quote: &str) -> Result<QuoteIdentifier> {
    let year = parse_field(quote, 2..4, QuoteField::Year)?;
    let month = parse_field(quote, 4..6, QuoteField::Month)?;
    let serial = quote
        .get(6..)
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| format_error(QuoteField::Serial, quote))?;

    Ok(QuoteIdentifier {
        year,
        month,
        serial,
    })
}

fn parse_field(quote: &str, range: std::ops::Range<usize>, field: QuoteField) -> Result<u32> {
    quote
        .get(range)
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| format_error(field, quote))
}

fn format_error(field: QuoteField, quote: &str) -> QuoteError {
    QuoteError::QuoteFormat {
        field,
        quote: quote.to_string(),
    }
}
