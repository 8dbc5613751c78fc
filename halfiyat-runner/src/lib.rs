//! Halfiyat Runner: configuration, persistence and run orchestration.
//!
//! This crate builds on `halfiyat-core` to provide:
//! - TOML run configuration and service-account credentials from the environment
//! - Logging initialization
//! - The document store seam with file-backed and in-memory stores
//! - The per-city push pipeline and run summary
//! - JSON snapshot export with a reproducible dataset hash

pub mod config;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod store;

pub use config::{AppConfig, ConfigError, Credentials, Layout, CREDENTIALS_ENV};
pub use export::{dataset_hash, write_snapshot, Snapshot};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use pipeline::{push_city_prices, run_cities, CityOutcome, PipelineError, RunSummary};
pub use store::{DocPath, DocumentStore, JsonFileStore, MemoryStore, StoreError, WriteBatch};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<AppConfig>();
        assert_sync::<AppConfig>();
        assert_send::<Credentials>();
        assert_sync::<Credentials>();
    }

    #[test]
    fn stores_are_send_sync() {
        assert_send::<JsonFileStore>();
        assert_sync::<JsonFileStore>();
        assert_send::<MemoryStore>();
        assert_sync::<MemoryStore>();
    }

    #[test]
    fn run_outputs_are_send_sync() {
        assert_send::<RunSummary>();
        assert_sync::<RunSummary>();
        assert_send::<Snapshot>();
        assert_sync::<Snapshot>();
    }
}
