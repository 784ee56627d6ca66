// Utility helpers for parsing, ordering and number display.
//
// Values stay full-precision floats everywhere else; truncation and
// thousands separators are applied only here, at display time.
use num_format::{Locale, ToFormattedString};
use std::cmp::Ordering;

/// Parse a CSV field as a number for column-kind inference and numeric
/// cells. Whitespace and `,` thousands separators are ignored; anything with
/// letters is not a number (so `2020` is, `Not specified` is not).
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

/// Plain display of a measure: integral values print without a fraction.
pub fn format_plain(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Numeric-aware ordering for category keys.
///
/// Keys that both parse as numbers compare numerically (so years sort as
/// years); numeric keys come before text keys; text keys compare
/// lexicographically.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (parse_f64_safe(Some(a)), parse_f64_safe(Some(b))) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Fixed decimals with `,` grouping, used for percentages
/// (`1234.5, 1` -> `1,234.5`). Negative zero prints without a sign.
pub fn format_number(n: f64, decimals: usize) -> String {
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // num-format groups the integer part only.
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// A summed measure as shown to a reader: truncated toward zero, then
/// grouped (`1234.9` -> `1,234`). Truncation only ever happens here.
pub fn format_count(n: f64) -> String {
    format_int(n.trunc() as i64)
}

/// `12.345` -> `12.3%`.
pub fn format_percent(p: f64, decimals: usize) -> String {
    format!("{}%", format_number(p, decimals))
}
