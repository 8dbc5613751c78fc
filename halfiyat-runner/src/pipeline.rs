//! Per-city push pipeline: route, build records, lay out documents, commit.
//!
//! A city with no data is reported and skipped. A city whose store write
//! fails is reported and counted; the run moves on to the next city.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use halfiyat_core::{build_records, CityId, CityRouter, PersistedRecord};

use crate::config::Layout;
use crate::store::{DocPath, DocumentStore, StoreError, WriteBatch};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("store write for {city} failed: {source}")]
    Store {
        city: CityId,
        #[source]
        source: StoreError,
    },
}

/// What one city produced in this run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityOutcome {
    pub city: CityId,
    pub effective_date: NaiveDate,
    pub records: Vec<PersistedRecord>,
    /// Documents committed; zero on dry runs and for empty cities.
    pub written: usize,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<CityOutcome>,
    pub failures: Vec<PipelineError>,
}

impl RunSummary {
    pub fn records(&self) -> impl Iterator<Item = &PersistedRecord> {
        self.outcomes.iter().flat_map(|o| o.records.iter())
    }

    pub fn total_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.written).sum()
    }

    pub fn empty_cities(&self) -> usize {
        self.outcomes.iter().filter(|o| o.records.is_empty()).count()
    }
}

// ─── Document layout ────────────────────────────────────────────────

/// Lay out one city's records as store writes.
///
/// Records whose stable id cannot be a document name are left out with a
/// warning rather than failing the whole city.
pub fn layout_batch(
    layout: Layout,
    city: &CityId,
    date: NaiveDate,
    records: &[PersistedRecord],
) -> Result<WriteBatch, StoreError> {
    let date_key = date.format("%Y-%m-%d").to_string();
    let city_path = DocPath::root().child(city.as_str())?;
    let mut batch = WriteBatch::new();

    match layout {
        Layout::PerProduct => {
            let day_path = city_path.child(&date_key)?;
            for record in records {
                let path = match day_path.child(&record.stable_id) {
                    Ok(path) => path,
                    Err(e) => {
                        warn!(city = %city, product = %record.product, error = %e, "skipping record");
                        continue;
                    }
                };
                batch.set(
                    path,
                    json!({
                        "product": record.product,
                        "unit": record.unit,
                        "price": record.price,
                        "city": record.city,
                        "date": date_key,
                    }),
                );
            }
        }
        Layout::CityDocument => {
            let items: Vec<Value> = records
                .iter()
                .map(|r| {
                    json!({
                        "product": r.product,
                        "unit": r.unit,
                        "price": r.price,
                        "stable_id": r.stable_id,
                    })
                })
                .collect();
            batch.set(city_path, json!({ "date": date_key, "items": items }));
        }
    }
    Ok(batch)
}

// ─── Per-city push ──────────────────────────────────────────────────

/// Fetch one city and, when a store is given, commit its records as one batch.
///
/// Without a store (dry run) the records are built but nothing is written.
pub fn push_city_prices(
    router: &CityRouter,
    store: Option<&dyn DocumentStore>,
    layout: Layout,
    city: &CityId,
    today: NaiveDate,
) -> Result<CityOutcome, PipelineError> {
    let result = router.route_from(city.as_str(), today);
    let records = build_records(city, &result);
    let mut outcome = CityOutcome {
        city: city.clone(),
        effective_date: result.effective_date,
        records,
        written: 0,
    };

    if outcome.records.is_empty() {
        warn!(city = %city, date = %result.effective_date, "no records, skipping");
        return Ok(outcome);
    }

    let Some(store) = store else {
        info!(
            city = %city,
            date = %outcome.effective_date,
            records = outcome.records.len(),
            "dry run, not persisting"
        );
        return Ok(outcome);
    };

    let store_err = |source| PipelineError::Store {
        city: city.clone(),
        source,
    };
    let batch = layout_batch(layout, city, outcome.effective_date, &outcome.records)
        .map_err(store_err)?;
    outcome.written = store.commit(batch).map_err(store_err)?;

    info!(
        city = %city,
        date = %outcome.effective_date,
        records = outcome.records.len(),
        written = outcome.written,
        "records written"
    );
    Ok(outcome)
}

/// Run every city in order. Per-city failures are logged and collected.
pub fn run_cities(
    router: &CityRouter,
    store: Option<&dyn DocumentStore>,
    layout: Layout,
    cities: &[CityId],
    today: NaiveDate,
) -> RunSummary {
    let mut summary = RunSummary::default();
    for city in cities {
        match push_city_prices(router, store, layout, city, today) {
            Ok(outcome) => summary.outcomes.push(outcome),
            Err(e) => {
                error!(city = %city, error = %e, "city failed");
                summary.failures.push(e);
            }
        }
    }
    info!(
        cities = cities.len(),
        written = summary.total_written(),
        empty = summary.empty_cities(),
        failed = summary.failures.len(),
        "run finished"
    );
    summary
}
