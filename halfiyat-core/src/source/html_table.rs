//! HTML-table adapter: prices published as a plain `<table>` on a page.
//!
//! Pages aren't date-parameterized; they show whatever the market published
//! last. The table is the first one on the page, or the first whose header
//! cells mention one of the configured markers (e.g. `CİNSİ`). The first row
//! is the header; each following row is read as four fixed-position cells:
//! product, unit, and the two price bounds.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::http::HttpFetch;
use super::{AdapterOutput, SourceAdapter, SourceError};
use crate::domain::PriceRange;
use crate::normalize::normalize;

/// Minimum cells a data row needs before it is parsed at all.
pub const MIN_CELLS: usize = 4;

/// Which of cells 2 and 3 holds the high price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOrder {
    /// product | unit | high | low
    #[default]
    HighLow,
    /// product | unit | low | high
    LowHigh,
}

/// Settings for an HTML table source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlTableSpec {
    pub url: String,
    /// Header substrings (case-insensitive) identifying the price table.
    /// Empty means "first table on the page".
    #[serde(default)]
    pub header_markers: Vec<String>,
    #[serde(default)]
    pub columns: ColumnOrder,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

impl HtmlTableSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            header_markers: Vec::new(),
            columns: ColumnOrder::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub struct HtmlTableAdapter {
    name: String,
    spec: HtmlTableSpec,
    http: Arc<dyn HttpFetch>,
}

impl HtmlTableAdapter {
    pub fn new(name: &str, spec: HtmlTableSpec, http: Arc<dyn HttpFetch>) -> Self {
        Self {
            name: name.to_string(),
            spec,
            http,
        }
    }
}

impl SourceAdapter for HtmlTableAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_fetch(&self, _date: NaiveDate) -> Result<AdapterOutput, SourceError> {
        let url = &self.spec.url;
        let page = self
            .http
            .get_text(url, Duration::from_secs(self.spec.timeout_secs))?;
        parse_price_table(&page, &self.spec.header_markers, self.spec.columns)
            .ok_or_else(|| SourceError::MissingTable { url: url.clone() })
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Extract entries from the price table in `page`; `None` if no table matches.
pub fn parse_price_table(
    page: &str,
    header_markers: &[String],
    columns: ColumnOrder,
) -> Option<AdapterOutput> {
    let document = Html::parse_document(page);
    let table_sel = selector("table");
    let row_sel = selector("tr");
    let cell_sel = selector("td");

    let table = document
        .select(&table_sel)
        .find(|t| header_markers.is_empty() || header_matches(*t, header_markers))?;

    let mut output = AdapterOutput::default();
    for row in table.select(&row_sel).skip(1) {
        let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
        if cells.len() < MIN_CELLS {
            output.skip();
            continue;
        }

        let (high, low) = match columns {
            ColumnOrder::HighLow => (&cells[2], &cells[3]),
            ColumnOrder::LowHigh => (&cells[3], &cells[2]),
        };
        let range = PriceRange {
            product: Some(cells[0].clone()),
            unit: Some(cells[1].clone()),
            price_min: normalize(low.as_str()),
            price_max: normalize(high.as_str()),
        };
        output.record(range.into_entry());
    }
    Some(output)
}

fn header_matches(table: ElementRef<'_>, markers: &[String]) -> bool {
    let th_sel = selector("th");
    let header = table
        .select(&th_sel)
        .map(|th| cell_text(th).to_uppercase())
        .collect::<Vec<_>>()
        .join(" ");
    markers
        .iter()
        .any(|m| header.contains(m.to_uppercase().as_str()))
}

/// Cell text with inner whitespace collapsed.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
