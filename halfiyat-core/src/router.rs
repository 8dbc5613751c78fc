//! City routing: city identifier in, fetch result out.
//!
//! The router is a plain dispatch table. A city with no configured source is
//! not an error; it routes to an empty result dated today.

use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use crate::catalog::CityConfig;
use crate::domain::{CityId, FetchResult};
use crate::fallback::DateFallbackFetcher;
use crate::source::HttpFetch;

struct Route {
    display_name: String,
    fetcher: DateFallbackFetcher,
}

#[derive(Default)]
pub struct CityRouter {
    routes: BTreeMap<CityId, Route>,
}

impl CityRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one fallback fetcher per catalog entry, all over the same transport.
    /// Later entries with the same id replace earlier ones.
    ///
    /// `window` applies to date-parameterized sources. Undated sources are
    /// tried once, for today.
    pub fn from_catalog(catalog: &[CityConfig], http: Arc<dyn HttpFetch>, window: u32) -> Self {
        let mut router = Self::new();
        for city in catalog {
            let adapter = city.source.build(city.id.as_str(), Arc::clone(&http));
            let days = if city.source.is_dated() { window } else { 1 };
            router.insert(
                city.id.clone(),
                city.display_name(),
                DateFallbackFetcher::new(adapter).with_window(days),
            );
        }
        router
    }

    pub fn insert(&mut self, city: CityId, display_name: &str, fetcher: DateFallbackFetcher) {
        self.routes.insert(
            city,
            Route {
                display_name: display_name.to_string(),
                fetcher,
            },
        );
    }

    pub fn contains(&self, city: &str) -> bool {
        self.routes.contains_key(&CityId::new(city))
    }

    /// Configured cities in id order.
    pub fn cities(&self) -> impl Iterator<Item = &CityId> {
        self.routes.keys()
    }

    pub fn display_name(&self, city: &str) -> Option<&str> {
        self.routes
            .get(&CityId::new(city))
            .map(|r| r.display_name.as_str())
    }

    /// Route relative to the local calendar day.
    pub fn route(&self, city: &str) -> FetchResult {
        self.route_from(city, Local::now().date_naive())
    }

    /// Route relative to an explicit `today`.
    pub fn route_from(&self, city: &str, today: NaiveDate) -> FetchResult {
        let id = CityId::new(city);
        match self.routes.get(&id) {
            Some(route) => route.fetcher.fetch_from(today),
            None => {
                warn!(city = %id, "no source configured for city");
                FetchResult::empty(today)
            }
        }
    }
}
