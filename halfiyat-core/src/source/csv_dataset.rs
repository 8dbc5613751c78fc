//! CSV adapter: the whole price history ships as one file.
//!
//! The download is not date-parameterized, so rows are filtered locally on
//! their date column. Dates may carry a time-of-day suffix
//! (`2023-12-26 00:00:00`); only the first 10 characters are compared.

use chrono::NaiveDate;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::fields::{first_text, resolve_row, strings, FieldAliases, RawSourceRow};
use super::http::HttpFetch;
use super::{date_key, AdapterOutput, SourceAdapter, SourceError};
use crate::normalize::PriceInput;

/// Settings for a CSV dataset source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvDatasetSpec {
    pub url: String,
    #[serde(default = "default_date_columns")]
    pub date_columns: Vec<String>,
    #[serde(default)]
    pub fields: FieldAliases,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_date_columns() -> Vec<String> {
    strings(&["tarih", "TARIH"])
}

fn default_timeout_secs() -> u64 {
    30
}

impl CsvDatasetSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            date_columns: default_date_columns(),
            fields: FieldAliases::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// One CSV record viewed through its header row.
struct CsvRow<'a> {
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl RawSourceRow for CsvRow<'_> {
    fn value(&self, key: &str) -> PriceInput<'_> {
        self.headers
            .iter()
            .position(|h| h == key)
            .and_then(|i| self.record.get(i))
            .map_or(PriceInput::Missing, PriceInput::Text)
    }
}

pub struct CsvDatasetAdapter {
    name: String,
    spec: CsvDatasetSpec,
    http: Arc<dyn HttpFetch>,
}

impl CsvDatasetAdapter {
    pub fn new(name: &str, spec: CsvDatasetSpec, http: Arc<dyn HttpFetch>) -> Self {
        Self {
            name: name.to_string(),
            spec,
            http,
        }
    }
}

impl SourceAdapter for CsvDatasetAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_fetch(&self, date: NaiveDate) -> Result<AdapterOutput, SourceError> {
        let url = &self.spec.url;
        let body = self
            .http
            .get_text(url, Duration::from_secs(self.spec.timeout_secs))?;
        filter_rows(&body, &date_key(date), &self.spec).map_err(|e| SourceError::Csv {
            url: url.clone(),
            reason: e.to_string(),
        })
    }
}

/// Parse `body` and keep the rows published for `target` (`YYYY-MM-DD`).
fn filter_rows(
    body: &str,
    target: &str,
    spec: &CsvDatasetSpec,
) -> Result<AdapterOutput, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    // Excel exports prepend a BOM to the first header.
    let headers: StringRecord = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect();

    let mut output = AdapterOutput::default();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(line = line + 2, error = %e, "unreadable CSV record");
                continue;
            }
        };
        let row = CsvRow {
            headers: &headers,
            record: &record,
        };

        let Some(raw_date) = first_text(&row, &spec.date_columns) else {
            continue;
        };
        let day: String = raw_date.chars().take(10).collect();
        if day != target {
            continue;
        }

        output.record(resolve_row(&row, &spec.fields));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::http::CannedHttp;

    const URL: &str = "https://acikveri.test/hal_fiyatlari.csv";

    const BODY: &str = "\u{feff}tarih,urun_ad,birim,en_dusuk_fiyat,en_yuksek_fiyat\n\
        2024-06-14 00:00:00,Domates,KG,\"10,00\",\"20,00\"\n\
        2024-06-14,Biber,,15,\n\
        2024-06-13,Patlican,KG,8,12\n\
        2024-06-14,,KG,1,2\n\
        2024-06-14,Kabak,KG,,\n";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    fn adapter(body: &str) -> CsvDatasetAdapter {
        let http = CannedHttp::new().with_body(URL, body);
        CsvDatasetAdapter::new("konya", CsvDatasetSpec::new(URL), Arc::new(http))
    }

    #[test]
    fn filters_to_target_date_with_truncation() {
        let out = adapter(BODY).try_fetch(date()).unwrap();
        let products: Vec<&str> = out.entries.iter().map(|e| e.product.as_str()).collect();
        assert_eq!(products, vec!["Domates", "Biber"]);
    }

    #[test]
    fn other_dates_are_excluded_even_when_valid() {
        let day_before = NaiveDate::from_ymd_opt(2024, 6, 13).unwrap();
        let out = adapter(BODY).try_fetch(day_before).unwrap();
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].product, "Patlican");
        assert_eq!(out.entries[0].price, 10.0);
    }

    #[test]
    fn range_and_unit_rules() {
        let out = adapter(BODY).try_fetch(date()).unwrap();
        assert_eq!(out.entries[0].price, 15.0);
        assert_eq!(out.entries[1].price, 15.0);
        assert_eq!(out.entries[1].unit, "KG");
        assert_eq!(out.stats.dropped, 2);
    }

    #[test]
    fn upper_case_headers() {
        let body = "TARIH,URUN_AD,BIRIM,EN_DUSUK_FIYAT,EN_YUKSEK_FIYAT\n\
            2024-06-14,Havuc,KG,6,8\n";
        let out = adapter(body).try_fetch(date()).unwrap();
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].price, 7.0);
    }

    #[test]
    fn download_failure_is_empty_publicly() {
        let a = CsvDatasetAdapter::new(
            "konya",
            CsvDatasetSpec::new(URL),
            Arc::new(CannedHttp::new().with_timeout(URL)),
        );
        assert!(matches!(a.try_fetch(date()), Err(SourceError::Timeout { .. })));
        assert!(a.fetch_for_date(date()).is_empty());
    }
}
