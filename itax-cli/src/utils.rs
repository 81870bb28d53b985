use std::sync::LazyLock;

use itax_core::calculations::common::round_half_up;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

/// Plain digits, western grouping (`1,234,567`) or Indian grouping
/// (`12,34,567`), with an optional fraction.
static AMOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:\d+|\d{1,3}(?:,\d{3})+|\d{1,2}(?:,\d{2})*,\d{3})(?:\.\d+)?$")
        .expect("amount pattern is valid")
});

/// Error returned when a string cannot be parsed as a rupee amount.
#[derive(Debug, Error)]
pub enum ParseAmountError {
    #[error("invalid amount '{0}': expected digits with optional ',' grouping")]
    Malformed(String),

    #[error("invalid amount '{input}': {source}")]
    OutOfRange {
        input: String,
        #[source]
        source: rust_decimal::Error,
    },
}

/// Trims whitespace and a leading currency marker.
fn normalize_amount_input(s: &str) -> &str {
    let trimmed = s.trim();
    ["₹", "Rs.", "Rs", "INR"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed)
        .trim()
}

/// Parses a rupee amount.
///
/// Accepts western or Indian digit grouping (`"1,200,000"`, `"12,00,000"`)
/// and an optional `₹`/`Rs` prefix. Empty input is 0.
pub fn parse_amount(s: &str) -> Result<Decimal, ParseAmountError> {
    let normalized = normalize_amount_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    if !AMOUNT_PATTERN.is_match(normalized) {
        tracing::error!(input = %s, "invalid amount");
        return Err(ParseAmountError::Malformed(s.to_string()));
    }
    normalized
        .replace(',', "")
        .parse()
        .map_err(|e| ParseAmountError::OutOfRange {
            input: s.to_string(),
            source: e,
        })
}

/// Formats rupees with Indian digit grouping, e.g. `₹12,34,567.00`.
///
/// Rounds half away from zero to paise.
pub fn format_inr(amount: Decimal) -> String {
    let rounded = round_half_up(amount);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}₹{}.{fraction}", group_indian(whole))
}

/// Inserts commas: the last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

/// Formats a rate held as a fraction (`0.05`) as a percentage (`5%`).
pub fn format_rate(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

/// Formats a value that is already a percentage with two decimals.
pub fn format_percent(percent: Decimal) -> String {
    format!("{:.2}%", round_half_up(percent))
}

/// Formats an optional ceiling, using "no limit" when `None`.
pub fn opt_amount_display(amount: Option<Decimal>) -> String {
    amount.map(format_inr).unwrap_or_else(|| "no limit".to_string())
}
