//! Text helpers for the values scraped from order pages.
//!
//! Everything in here is pure so it can be tested without a browser.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-)?[^\d\-]{0,4}?(\d[\d.,\u{a0}\u{202f} ]*\d|[.,]\d{1,2}\b|\d)").unwrap());

static QUANTITY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(\d+)\s*(?:x|×|of:)\s+(.+)$").unwrap());

static DATE_DAY_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\.?\s+(\p{L}+)\.?\s+(\d{4})").unwrap());

static DATE_MONTH_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{L}+)\.?\s+(\d{1,2}),?\s+(\d{4})").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Parses a localised currency amount into integer cents.
///
/// `"$1,234.56"` and `"1.234,56 €"` both give `123456`. Returns `None` when
/// the text carries no digits at all.
pub fn parse_cents(text: &str) -> Option<i64> {
    let caps = AMOUNT.captures(text)?;
    let negative = caps.get(1).is_some();
    let number: String = caps[2]
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    let decimal_at = decimal_separator_position(&number);
    let (whole, fraction) = match decimal_at {
        Some(pos) => (&number[..pos], &number[pos + 1..]),
        None => (number.as_str(), ""),
    };

    let whole_digits: String = whole.chars().filter(char::is_ascii_digit).collect();
    // ".99" has no whole part at all.
    let whole: i64 = if whole_digits.is_empty() {
        0
    } else {
        whole_digits.parse().ok()?
    };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction[..2].parse().ok()?,
    };

    let cents = whole.checked_mul(100)?.checked_add(fraction)?;
    Some(if negative { -cents } else { cents })
}

fn decimal_separator_position(number: &str) -> Option<usize> {
    let last_dot = number.rfind('.');
    let last_comma = number.rfind(',');

    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => Some(dot.max(comma)),
        (Some(pos), None) | (None, Some(pos)) => {
            let sep = number.as_bytes()[pos] as char;
            let occurrences = number.matches(sep).count();
            let digits_after = number.len() - pos - 1;
            (occurrences == 1 && (1..=2).contains(&digits_after)).then_some(pos)
        }
        (None, None) => None,
    }
}

/// Formats cents as a plain decimal number, e.g. `1234.56` or `1234,56`.
pub fn format_cents(cents: i64, decimal_separator: char) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}{}{:02}", sign, abs / 100, decimal_separator, abs % 100)
}

/// Splits a quantity prefix off an item name: `"2 x Widget"` is `(2, "Widget")`.
pub fn split_quantity(text: &str) -> (u32, String) {
    if let Some(caps) = QUANTITY_PREFIX.captures(text) {
        if let Ok(quantity) = caps[1].parse::<u32>() {
            if quantity > 0 {
                return (quantity, collapse_whitespace(&caps[2]));
            }
        }
    }
    (1, collapse_whitespace(text))
}

/// Parses a quantity badge such as `"3"` or `"Qty: 3"`, defaulting to 1.
pub fn parse_quantity(text: &str) -> u32 {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .filter(|q| *q > 0)
        .unwrap_or(1)
}

/// Finds an order date inside free text like "Ordered on March 3, 2021".
pub fn parse_order_date(text: &str) -> Option<NaiveDate> {
    for caps in DATE_MONTH_FIRST.captures_iter(text) {
        if let Some(date) = build_date(&caps[3], &caps[1], &caps[2]) {
            return Some(date);
        }
    }
    for caps in DATE_DAY_FIRST.captures_iter(text) {
        if let Some(date) = build_date(&caps[3], &caps[2], &caps[1]) {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

fn build_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month_number(month)?, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&[&str]; 12] = [
        &["january", "jan", "januar", "jän"],
        &["february", "feb", "februar"],
        &["march", "mar", "märz", "mär", "maerz"],
        &["april", "apr"],
        &["may", "mai"],
        &["june", "jun", "juni"],
        &["july", "jul", "juli"],
        &["august", "aug"],
        &["september", "sep", "sept"],
        &["october", "oct", "oktober", "okt"],
        &["november", "nov"],
        &["december", "dec", "dezember", "dez"],
    ];

    let name = name.to_lowercase();
    MONTHS
        .iter()
        .position(|aliases| aliases.contains(&name.as_str()))
        .map(|i| i as u32 + 1)
}

/// Trims and collapses inner runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Shipping as the gap between an order-level subtotal and the item sum.
pub fn infer_shipping(order_subtotal: i64, items_sum: i64) -> i64 {
    (order_subtotal - items_sum).max(0)
}
