//! JSON snapshot of a run.
//!
//! The snapshot mirrors what was fetched, grouped by city, and carries a
//! BLAKE3 `dataset_hash` over the sorted `(city, date, stable_id, price)`
//! tuples. Two runs over identical data hash identically regardless of
//! `generated_at` or source ordering.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use halfiyat_core::PersistedRecord;

use crate::pipeline::RunSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub product: String,
    pub unit: String,
    pub price: f64,
    pub stable_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySnapshot {
    pub date: NaiveDate,
    pub items: Vec<SnapshotItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// ISO-8601 UTC with a `Z` suffix.
    pub generated_at: String,
    pub dataset_hash: String,
    pub cities: BTreeMap<String, CitySnapshot>,
}

impl Snapshot {
    /// Every routed city appears, including those that came back empty.
    pub fn from_summary(summary: &RunSummary, generated_at: DateTime<Utc>) -> Self {
        let cities = summary
            .outcomes
            .iter()
            .map(|outcome| {
                let items = outcome
                    .records
                    .iter()
                    .map(|r| SnapshotItem {
                        product: r.product.clone(),
                        unit: r.unit.clone(),
                        price: r.price,
                        stable_id: r.stable_id.clone(),
                    })
                    .collect();
                (
                    outcome.city.to_string(),
                    CitySnapshot {
                        date: outcome.effective_date,
                        items,
                    },
                )
            })
            .collect();

        Self {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            dataset_hash: dataset_hash(summary.records()),
            cities,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize snapshot")
    }
}

/// Order-independent digest of the fetched data.
pub fn dataset_hash<'a>(records: impl IntoIterator<Item = &'a PersistedRecord>) -> String {
    let mut lines: Vec<String> = records
        .into_iter()
        .map(|r| format!("{}\t{}\t{}\t{}\n", r.city, r.date, r.stable_id, r.price))
        .collect();
    lines.sort();

    let mut hasher = blake3::Hasher::new();
    for line in &lines {
        hasher.update(line.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Write the snapshot as indented JSON, creating parent directories.
pub fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = snapshot.to_json()?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
