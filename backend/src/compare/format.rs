//! Display formatting of matrix values, and its inverse.
//!
//! | Kind       | `1234.5`      | `-1234.5`      |
//! |------------|---------------|----------------|
//! | Currency   | `$ 1,234.50`  | `$ (1,234.50)` |
//! | Quantity   | `1,234`       | `-1,234`       |
//! | Percentage | `123,450.00 %`| `123,450.00 %` |
//!
//! Percentages are stored as fractions and shown without a sign.

use crate::models::{CellValue, MetricKind, MISSING_MARKER};

/// Format a matrix cell for `metric`.
///
/// The missing marker passes through unchanged, NaN becomes an empty string.
pub fn format_value(value: &CellValue, metric: &str) -> String {
    match value {
        CellValue::Number(n) => format_number(*n, MetricKind::for_metric(metric)),
        CellValue::Missing => MISSING_MARKER.to_string(),
    }
}

/// Format a number by metric kind.
pub fn format_number(value: f64, kind: MetricKind) -> String {
    if value.is_nan() {
        return String::new();
    }

    match kind {
        MetricKind::Percentage => {
            format!("{} %", group_thousands(&format!("{:.2}", (value * 100.0).abs())))
        }
        // No whole number to print; the raw value passes through
        MetricKind::Quantity if value.is_infinite() => value.to_string(),
        MetricKind::Quantity => {
            // trunc() keeps -0.0 for values in (-1, 0)
            let whole = if value.trunc() == 0.0 { 0.0 } else { value.trunc() };
            group_thousands(&format!("{:.0}", whole))
        }
        MetricKind::Currency => {
            let magnitude = group_thousands(&format!("{:.2}", value.abs()));
            if value < 0.0 {
                format!("$ ({})", magnitude)
            } else {
                format!("$ {}", magnitude)
            }
        }
    }
}

/// Recover a number from a formatted cell.
///
/// Strips `%`, `$`, `,` and whitespace; accounting parentheses make the
/// value negative. Returns `None` for the missing marker, empty strings and
/// anything else that is not a number.
pub fn parse_display(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter_map(|c| match c {
            '(' => Some('-'),
            ')' | '%' | '$' | ',' => None,
            c if c.is_whitespace() => None,
            c => Some(c),
        })
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Insert `,` every three digits of the integer part of a plain decimal.
fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(number.len() + int_part.len() / 3);
    grouped.push_str(sign);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
