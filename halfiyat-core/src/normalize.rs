//! Price normalization.
//!
//! Municipal sources publish prices as `"4,50"`, `"4.50"`, `"1.234,56 TL"`,
//! `"120 ₺"` or plain JSON numbers. Everything funnels through [`normalize`],
//! which never fails loudly: anything it cannot read becomes `None`.
//!
//! Separator rules:
//! - exactly one comma and no period: the comma is the decimal point (`4,50`)
//! - one comma after the last period: periods group thousands (`1.234,56`)
//! - anything else: commas group thousands, the period is the decimal point
//!   (`1,234.56`, `1,234,567`)

use serde_json::Value;

/// Raw price value as it arrives from a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceInput<'a> {
    /// Field absent or null.
    Missing,
    /// Already numeric (JSON number).
    Number(f64),
    /// Text that still needs locale handling.
    Text(&'a str),
}

impl<'a> From<&'a str> for PriceInput<'a> {
    fn from(s: &'a str) -> Self {
        PriceInput::Text(s)
    }
}

impl<'a> From<Option<&'a str>> for PriceInput<'a> {
    fn from(s: Option<&'a str>) -> Self {
        s.map_or(PriceInput::Missing, PriceInput::Text)
    }
}

impl From<f64> for PriceInput<'_> {
    fn from(v: f64) -> Self {
        PriceInput::Number(v)
    }
}

impl<'a> From<&'a Value> for PriceInput<'a> {
    fn from(v: &'a Value) -> Self {
        match v {
            Value::Number(n) => n.as_f64().map_or(PriceInput::Missing, PriceInput::Number),
            Value::String(s) => PriceInput::Text(s),
            _ => PriceInput::Missing,
        }
    }
}

/// Normalize a raw price into a finite `f64`, or `None` when it cannot be read.
///
/// Zero is a valid price; only missing, blank or unparseable input is `None`.
pub fn normalize<'a>(raw: impl Into<PriceInput<'a>>) -> Option<f64> {
    match raw.into() {
        PriceInput::Missing => None,
        PriceInput::Number(v) => v.is_finite().then_some(v),
        PriceInput::Text(s) => parse_price_text(s),
    }
}

fn parse_price_text(raw: &str) -> Option<f64> {
    let cleaned = strip_decorations(raw);
    if cleaned.is_empty() {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let last_comma = cleaned.rfind(',');
    let last_period = cleaned.rfind('.');

    let canonical = match (commas, last_period) {
        (1, None) => cleaned.replace(',', "."),
        (1, Some(period)) if last_comma > Some(period) => {
            cleaned.replace('.', "").replace(',', ".")
        }
        _ => cleaned.replace(',', ""),
    };

    canonical.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Drop whitespace (including non-breaking spaces), lira markers wherever
/// they appear and a trailing per-unit suffix such as `/KG`.
fn strip_decorations(raw: &str) -> String {
    let mut compact = String::with_capacity(raw.len());
    let mut chars = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '₺')
        .peekable();
    while let Some(c) = chars.next() {
        let lira = c.eq_ignore_ascii_case(&'t')
            && chars.peek().is_some_and(|n| n.eq_ignore_ascii_case(&'l'));
        if lira {
            chars.next();
            continue;
        }
        compact.push(c);
    }

    match compact.rsplit_once('/') {
        Some((amount, unit)) if !unit.is_empty() && unit.chars().all(char::is_alphabetic) => {
            amount.to_string()
        }
        _ => compact,
    }
}
