//! Source adapters and their shared contract.
//!
//! Every municipal source has its own shape: a date-parameterized JSON API, a
//! CSV dump of the whole history, a raw HTML table, or prices buried in page
//! text. Each is described declaratively by a [`SourceSpec`] and turned into a
//! [`SourceAdapter`] by [`SourceSpec::build`], so adding a city means adding a
//! catalog entry rather than new control flow.
//!
//! Adapters report failures as a typed [`SourceError`] from `try_fetch`, but
//! the public `fetch_for_date` coerces every failure to an empty list: "nothing
//! published" and "fetch failed" both mean "try the previous day".

pub mod csv_dataset;
pub mod fields;
pub mod html_table;
pub mod http;
pub mod json_api;
pub mod text_lines;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::PriceEntry;

pub use csv_dataset::{CsvDatasetAdapter, CsvDatasetSpec};
pub use fields::FieldAliases;
pub use html_table::{ColumnOrder, HtmlTableAdapter, HtmlTableSpec};
pub use http::{BlockingHttp, CannedHttp, HttpFetch};
pub use json_api::{JsonApiAdapter, JsonApiSpec};
pub use text_lines::{TextLinesAdapter, TextLinesSpec};

/// Why a single adapter invocation produced nothing.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("malformed JSON from {url}: {reason}")]
    Json { url: String, reason: String },

    #[error("malformed CSV from {url}: {reason}")]
    Csv { url: String, reason: String },

    #[error("no price table found at {url}")]
    MissingTable { url: String },

    #[error("unexpected response shape from {url}: {reason}")]
    UnexpectedShape { url: String, reason: String },
}

/// Row accounting for one adapter invocation.
///
/// `skipped` rows were structurally unusable and never parsed (e.g. a table
/// row with too few cells); `dropped` rows were parsed but had no product or
/// no resolvable price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterStats {
    pub seen: usize,
    pub kept: usize,
    pub skipped: usize,
    pub dropped: usize,
}

/// Entries produced by one adapter invocation, with row accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterOutput {
    pub entries: Vec<PriceEntry>,
    pub stats: AdapterStats,
}

impl AdapterOutput {
    /// Count a parsed row; keep it if it validated.
    pub fn record(&mut self, entry: Option<PriceEntry>) {
        self.stats.seen += 1;
        match entry {
            Some(e) => {
                self.stats.kept += 1;
                self.entries.push(e);
            }
            None => self.stats.dropped += 1,
        }
    }

    /// Count a row rejected before parsing.
    pub fn skip(&mut self) {
        self.stats.seen += 1;
        self.stats.skipped += 1;
    }
}

/// One external origin of price data.
pub trait SourceAdapter: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Fetch and normalize the listing for `date`, surfacing the failure reason.
    fn try_fetch(&self, date: NaiveDate) -> Result<AdapterOutput, SourceError>;

    /// Fetch and normalize the listing for `date`. Never fails: any error is
    /// logged and becomes an empty list.
    fn fetch_for_date(&self, date: NaiveDate) -> Vec<PriceEntry> {
        match self.try_fetch(date) {
            Ok(output) => {
                debug!(
                    source = self.name(),
                    %date,
                    seen = output.stats.seen,
                    kept = output.stats.kept,
                    skipped = output.stats.skipped,
                    dropped = output.stats.dropped,
                    "source rows processed"
                );
                output.entries
            }
            Err(e) => {
                warn!(source = self.name(), %date, error = %e, "source fetch failed, treating as no data");
                Vec::new()
            }
        }
    }
}

/// Declarative description of a source: a parser strategy tag plus its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSpec {
    JsonApi(JsonApiSpec),
    CsvDataset(CsvDatasetSpec),
    HtmlTable(HtmlTableSpec),
    TextLines(TextLinesSpec),
}

impl SourceSpec {
    /// Instantiate the adapter for this spec over the given transport.
    pub fn build(&self, name: &str, http: Arc<dyn HttpFetch>) -> Box<dyn SourceAdapter> {
        match self {
            SourceSpec::JsonApi(spec) => Box::new(JsonApiAdapter::new(name, spec.clone(), http)),
            SourceSpec::CsvDataset(spec) => {
                Box::new(CsvDatasetAdapter::new(name, spec.clone(), http))
            }
            SourceSpec::HtmlTable(spec) => {
                Box::new(HtmlTableAdapter::new(name, spec.clone(), http))
            }
            SourceSpec::TextLines(spec) => {
                Box::new(TextLinesAdapter::new(name, spec.clone(), http))
            }
        }
    }

    /// Whether the fetched listing depends on the requested date. Undated
    /// sources always return the current page, so older dates add nothing.
    pub fn is_dated(&self) -> bool {
        match self {
            SourceSpec::JsonApi(spec) => spec.url.contains("{date}"),
            SourceSpec::CsvDataset(_) => true,
            SourceSpec::HtmlTable(_) | SourceSpec::TextLines(_) => false,
        }
    }

    /// Strategy tag, as written in config files.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceSpec::JsonApi(_) => "json_api",
            SourceSpec::CsvDataset(_) => "csv_dataset",
            SourceSpec::HtmlTable(_) => "html_table",
            SourceSpec::TextLines(_) => "text_lines",
        }
    }
}

/// The target date as sources expect it in URLs and date columns.
pub(crate) fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
