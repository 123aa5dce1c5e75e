//! en-IN display formatting for amounts and timestamps

use crate::error::{ClientError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const RUPEE: char = '₹';

/// Parse an amount that may arrive as a JSON number or a numeric string
pub fn parse_amount(value: &serde_json::Value) -> Result<f64> {
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    amount
        .filter(|a| a.is_finite())
        .ok_or_else(|| ClientError::InvalidAmount(value.to_string()))
}

/// Balance display: rupee sign and exactly two decimals, no grouping
pub fn format_balance(amount: f64) -> String {
    format!("{}{:.2}", RUPEE, amount)
}

/// Currency display using Indian digit grouping (`₹12,34,567.50`)
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };

    format!("{}{}{}.{}", sign, RUPEE, group_indian(int_part), frac_part)
}

/// Group digits as 3 then 2s from the right: 1234567 -> 12,34,567
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

    format!("{},{}", groups.join(","), tail)
}

/// Date display like `19 Oct 2026, 02:30 pm`
///
/// Accepts RFC 3339 timestamps (formatted in their own offset) or naive
/// `YYYY-MM-DD HH:MM[:SS]` / `YYYY-MM-DDTHH:MM[:SS]` values.
pub fn format_date(input: &str) -> Result<String> {
    const DISPLAY: &str = "%d %b %Y, %I:%M %P";
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.format(DISPLAY).to_string());
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.format(DISPLAY).to_string())
        .ok_or_else(|| ClientError::InvalidDate(input.to_string()))
}
