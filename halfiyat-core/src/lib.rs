//! Halfiyat Core: wholesale produce-market ("hal") price ingestion.
//!
//! This crate turns unstable municipal price listings into one uniform record shape:
//! - Numeric normalization of locale-ambiguous price strings
//! - Source adapters for JSON APIs, CSV datasets, HTML tables and free-text pages
//! - Date fallback across a bounded lookback window
//! - City routing over a declarative catalog of sources
//! - Record building with stable, storage-safe product ids

pub mod catalog;
pub mod domain;
pub mod fallback;
pub mod normalize;
pub mod record;
pub mod router;
pub mod source;

pub use catalog::{default_catalog, CityConfig, DEFAULT_RUN_CITIES};
pub use domain::{CityId, FetchResult, PersistedRecord, PriceEntry, PriceRange, DEFAULT_UNIT};
pub use fallback::{DateFallbackFetcher, DEFAULT_LOOKBACK_DAYS};
pub use normalize::{normalize, PriceInput};
pub use record::{build_records, stable_id};
pub use router::CityRouter;
pub use source::{AdapterOutput, AdapterStats, SourceAdapter, SourceError, SourceSpec};
