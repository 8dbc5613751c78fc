//! Free-text-line adapter: prices embedded in page text rather than a table.
//!
//! Some municipalities publish the list as paragraphs or list items like
//! `Domates Kg 12,50 TL 18,00 TL`. Every line with two currency-suffixed
//! amounts is split at the first amount: the words before it end with the
//! unit and the rest is the product name.

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::http::HttpFetch;
use super::{AdapterOutput, SourceAdapter, SourceError};
use crate::domain::PriceRange;
use crate::normalize::normalize;

/// Two amounts, each followed by a currency marker, optionally joined by a dash.
const PRICE_PAIR: &str = r"(?i)(\d[\d.,]*)\s*(?:TL|₺)\s*[-–/]?\s*(\d[\d.,]*)\s*(?:TL|₺)";

/// Settings for a free-text source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLinesSpec {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

impl TextLinesSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub struct TextLinesAdapter {
    name: String,
    spec: TextLinesSpec,
    http: Arc<dyn HttpFetch>,
    pattern: Regex,
}

impl TextLinesAdapter {
    pub fn new(name: &str, spec: TextLinesSpec, http: Arc<dyn HttpFetch>) -> Self {
        Self {
            name: name.to_string(),
            spec,
            http,
            pattern: Regex::new(PRICE_PAIR).expect("static price pattern"),
        }
    }
}

impl SourceAdapter for TextLinesAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_fetch(&self, _date: NaiveDate) -> Result<AdapterOutput, SourceError> {
        let page = self
            .http
            .get_text(&self.spec.url, Duration::from_secs(self.spec.timeout_secs))?;
        Ok(parse_price_lines(&visible_text(&page), &self.pattern))
    }
}

/// Read every matching line of `text` as a low/high price range.
fn parse_price_lines(text: &str, pattern: &Regex) -> AdapterOutput {
    let mut output = AdapterOutput::default();
    for line in text.lines() {
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };

        let mut tokens: Vec<&str> = line[..whole.start()].split_whitespace().collect();
        let unit = if tokens.len() >= 2 { tokens.pop() } else { None };
        let product = unit.map(|_| {
            tokens
                .join(" ")
                .trim_end_matches([':', '-'])
                .trim()
                .to_string()
        });

        let range = PriceRange {
            product,
            unit: unit.map(str::to_string),
            price_min: caps.get(1).and_then(|m| normalize(m.as_str())),
            price_max: caps.get(2).and_then(|m| normalize(m.as_str())),
        };
        output.record(range.into_entry());
    }
    output
}

const HIDDEN: [&str; 4] = ["script", "style", "noscript", "template"];
const BLOCKS: [&str; 17] = [
    "p", "div", "li", "tr", "br", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "ul", "ol", "table", "td",
];

/// Page text as a human would see it, one block element per line.
///
/// Table cells also break lines so a row of `td`s never glues a product
/// to an unrelated neighbour.
pub fn visible_text(page: &str) -> String {
    let document = Html::parse_document(page);
    let mut out = String::new();
    collect_text(document.root_element(), &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if HIDDEN.contains(&name) {
        return;
    }
    let block = BLOCKS.contains(&name);
    if block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        }
    }
    if block {
        out.push('\n');
    }
}
