// In crates/core-types/src/format.rs

//! Display-only formatting. Nothing produced here is stored or compared.

use chrono::NaiveDate;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Formats a currency magnitude for display: `"0"`, or a signed value scaled
/// to `M` (one decimal) or `k` (no decimals).
///
/// Halves round away from zero, so `1500` renders as `"+2k"`.
pub fn format_currency(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let sign = if value >= 0.0 { '+' } else { '-' };
    let abs = value.abs();

    if abs >= 1_000_000.0 {
        let millions = (abs / 1_000_000.0 * 10.0).round() / 10.0;
        format!("{sign}{millions:.1}M")
    } else if abs >= 1_000.0 {
        let thousands = (abs / 1_000.0).round();
        format!("{sign}{thousands:.0}k")
    } else {
        format!("{sign}{:.0}", abs.round())
    }
}

/// `"Jan 5, 2024"` style.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// The canonical `YYYY-MM-DD` form used for storage and input fields.
pub fn format_date_for_input(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate(s.to_string()))
}
