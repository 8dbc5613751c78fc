//! Date fallback: walk back from today until a source has published.
//!
//! Markets publish with a lag of a day or two, and on holidays not at all.
//! The fetcher tries `today`, `today - 1`, ... for a fixed window and stops at
//! the first date that yields entries. Exhausting the window is not an error:
//! the result is empty and dated today.

use chrono::{Duration, Local, NaiveDate};
use tracing::{info, warn};

use crate::domain::FetchResult;
use crate::source::{date_key, SourceAdapter};

/// Calendar days tried, including today.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 3;

pub struct DateFallbackFetcher {
    adapter: Box<dyn SourceAdapter>,
    window: u32,
}

impl DateFallbackFetcher {
    pub fn new(adapter: Box<dyn SourceAdapter>) -> Self {
        Self {
            adapter,
            window: DEFAULT_LOOKBACK_DAYS,
        }
    }

    /// Override the window length. Always tries at least today.
    pub fn with_window(mut self, days: u32) -> Self {
        self.window = days.max(1);
        self
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn source_name(&self) -> &str {
        self.adapter.name()
    }

    /// Candidate dates, newest first.
    pub fn candidate_dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        (0..self.window)
            .map(|back| today - Duration::days(i64::from(back)))
            .collect()
    }

    /// Fetch relative to the local calendar day.
    pub fn fetch(&self) -> FetchResult {
        self.fetch_from(Local::now().date_naive())
    }

    /// Fetch relative to an explicit `today`.
    pub fn fetch_from(&self, today: NaiveDate) -> FetchResult {
        for date in self.candidate_dates(today) {
            info!(source = self.adapter.name(), date = %date_key(date), "trying date");
            let entries = self.adapter.fetch_for_date(date);
            if !entries.is_empty() {
                info!(
                    source = self.adapter.name(),
                    date = %date_key(date),
                    entries = entries.len(),
                    "found entries"
                );
                return FetchResult {
                    entries,
                    effective_date: date,
                };
            }
        }

        warn!(
            source = self.adapter.name(),
            days = self.window,
            "no data in lookback window"
        );
        FetchResult::empty(today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceEntry;
    use crate::source::{AdapterOutput, SourceError};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Publishes only on the given dates and records every date asked for.
    struct PublishesOn {
        dates: HashSet<NaiveDate>,
        asked: Mutex<Vec<NaiveDate>>,
    }

    impl PublishesOn {
        fn new(dates: &[NaiveDate]) -> Self {
            Self {
                dates: dates.iter().copied().collect(),
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    impl SourceAdapter for PublishesOn {
        fn name(&self) -> &str {
            "stub"
        }

        fn try_fetch(&self, date: NaiveDate) -> Result<AdapterOutput, SourceError> {
            self.asked.lock().unwrap().push(date);
            let mut out = AdapterOutput::default();
            if self.dates.contains(&date) {
                out.record(PriceEntry::new(Some("Domates"), None, Some(10.0)));
            }
            Ok(out)
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn candidates_descend_from_today() {
        let f = DateFallbackFetcher::new(Box::new(PublishesOn::new(&[])));
        assert_eq!(f.candidate_dates(day(10)), vec![day(10), day(9), day(8)]);
    }

    #[test]
    fn candidates_cross_month_boundary() {
        let f = DateFallbackFetcher::new(Box::new(PublishesOn::new(&[])));
        let march_1 = day(1);
        let feb_28 = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        assert_eq!(f.candidate_dates(march_1)[2], feb_28);
    }

    #[test]
    fn today_wins_when_published() {
        let f = DateFallbackFetcher::new(Box::new(PublishesOn::new(&[day(10), day(9)])));
        let r = f.fetch_from(day(10));
        assert_eq!(r.effective_date, day(10));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn falls_back_to_day_two() {
        let f = DateFallbackFetcher::new(Box::new(PublishesOn::new(&[day(8)])));
        let r = f.fetch_from(day(10));
        assert_eq!(r.effective_date, day(8));
        assert!(!r.is_empty());
    }

    #[test]
    fn exhausted_window_is_empty_and_dated_today() {
        let f = DateFallbackFetcher::new(Box::new(PublishesOn::new(&[day(7)])));
        let r = f.fetch_from(day(10));
        assert!(r.is_empty());
        assert_eq!(r.effective_date, day(10));
    }

    #[test]
    fn zero_window_still_tries_today() {
        let f = DateFallbackFetcher::new(Box::new(PublishesOn::new(&[day(10)]))).with_window(0);
        assert_eq!(f.window(), 1);
        assert_eq!(f.fetch_from(day(10)).effective_date, day(10));
    }
}
