//! Structured-API adapter: one GET against a date-parameterized JSON endpoint.
//!
//! The body is either a bare array of rows or an object with the rows under
//! one of several payload keys (`data`, `Data`, `result`, `Result`), tried in
//! that order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::fields::{resolve_row, strings, FieldAliases};
use super::http::HttpFetch;
use super::{date_key, AdapterOutput, SourceAdapter, SourceError};

/// Settings for a JSON API source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonApiSpec {
    /// Endpoint; `{date}` is replaced with the target date (`YYYY-MM-DD`).
    pub url: String,
    #[serde(default = "default_payload_keys")]
    pub payload_keys: Vec<String>,
    #[serde(default)]
    pub fields: FieldAliases,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_payload_keys() -> Vec<String> {
    strings(&["data", "Data", "result", "Result"])
}

fn default_timeout_secs() -> u64 {
    20
}

impl JsonApiSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            payload_keys: default_payload_keys(),
            fields: FieldAliases::default(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn url_for(&self, date: NaiveDate) -> String {
        self.url.replace("{date}", &date_key(date))
    }
}

pub struct JsonApiAdapter {
    name: String,
    spec: JsonApiSpec,
    http: Arc<dyn HttpFetch>,
}

impl JsonApiAdapter {
    pub fn new(name: &str, spec: JsonApiSpec, http: Arc<dyn HttpFetch>) -> Self {
        Self {
            name: name.to_string(),
            spec,
            http,
        }
    }
}

impl SourceAdapter for JsonApiAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_fetch(&self, date: NaiveDate) -> Result<AdapterOutput, SourceError> {
        let url = self.spec.url_for(date);
        let body = self
            .http
            .get_text(&url, Duration::from_secs(self.spec.timeout_secs))?;

        let doc: Value = serde_json::from_str(&body).map_err(|e| SourceError::Json {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let rows = payload_rows(&doc, &self.spec.payload_keys).map_err(|reason| {
            SourceError::UnexpectedShape {
                url: url.clone(),
                reason,
            }
        })?;

        let mut output = AdapterOutput::default();
        for row in rows {
            match row {
                Value::Object(map) => output.record(resolve_row(map, &self.spec.fields)),
                _ => output.skip(),
            }
        }
        Ok(output)
    }
}

/// Locate the row array: the document itself, or the first present payload key.
fn payload_rows<'a>(doc: &'a Value, keys: &[String]) -> Result<&'a [Value], String> {
    match doc {
        Value::Array(rows) => Ok(rows),
        Value::Object(map) => {
            let (key, payload) = keys
                .iter()
                .find_map(|k| map.get(k).filter(|v| !v.is_null()).map(|v| (k, v)))
                .ok_or_else(|| format!("none of the payload keys {keys:?} present"))?;
            match payload {
                Value::Array(rows) => Ok(rows),
                other => Err(format!("payload key '{key}' holds {}", kind(other))),
            }
        }
        other => Err(format!("top-level {} is neither array nor object", kind(other))),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
