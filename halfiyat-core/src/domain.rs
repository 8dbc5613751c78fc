//! Domain types: normalized entries, price ranges, fetch results and records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::transliterate;

/// Unit used when a source leaves the unit column empty.
pub const DEFAULT_UNIT: &str = "KG";

/// One validated `(product, unit, price)` triple.
///
/// Only [`PriceEntry::new`] and [`PriceRange::into_entry`] construct entries,
/// so an entry always has a non-blank product and a finite price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub product: String,
    pub unit: String,
    pub price: f64,
}

impl PriceEntry {
    /// Validate raw fields into an entry.
    ///
    /// Returns `None` when the product is missing or blank, or the price is
    /// undefined or non-finite. A blank unit falls back to [`DEFAULT_UNIT`].
    pub fn new(product: Option<&str>, unit: Option<&str>, price: Option<f64>) -> Option<Self> {
        let product = product.map(str::trim).filter(|p| !p.is_empty())?;
        let price = price.filter(|p| p.is_finite())?;
        let unit = unit
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_UNIT);

        Some(Self {
            product: product.to_string(),
            unit: unit.to_string(),
            price,
        })
    }
}

/// Low/high bounds reported by sources that don't publish an average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub product: Option<String>,
    pub unit: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

impl PriceRange {
    /// Representative price: the mean of both bounds, or whichever one is defined.
    pub fn representative(&self) -> Option<f64> {
        match (self.price_min, self.price_max) {
            (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        }
    }

    /// Collapse into a [`PriceEntry`], dropping ranges with no product or no bounds.
    pub fn into_entry(self) -> Option<PriceEntry> {
        let price = self.representative();
        PriceEntry::new(self.product.as_deref(), self.unit.as_deref(), price)
    }
}

/// Entries fetched for one city, plus the date they were actually published for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub entries: Vec<PriceEntry>,
    pub effective_date: NaiveDate,
}

impl FetchResult {
    /// "No data available" for the given day.
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            entries: Vec::new(),
            effective_date: today,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// The record shape handed to the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub product: String,
    pub unit: String,
    pub price: f64,
    pub city: String,
    pub date: NaiveDate,
    pub stable_id: String,
}

/// Canonical city identifier: an ASCII lowercase slug.
///
/// `"İzmir"`, `"IZMIR"`, `"Izmir"` and `"izmir"` all become `izmir`, so the
/// router, the persisted `city` field and store paths agree on one spelling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CityId(String);

impl CityId {
    pub fn new(raw: &str) -> Self {
        Self(transliterate(raw.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CityId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for CityId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<CityId> for String {
    fn from(id: CityId) -> Self {
        id.0
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_requires_product_and_price() {
        assert!(PriceEntry::new(None, Some("KG"), Some(1.0)).is_none());
        assert!(PriceEntry::new(Some("  "), Some("KG"), Some(1.0)).is_none());
        assert!(PriceEntry::new(Some("Domates"), Some("KG"), None).is_none());
        assert!(PriceEntry::new(Some("Domates"), Some("KG"), Some(f64::NAN)).is_none());
    }

    #[test]
    fn entry_defaults_unit() {
        let e = PriceEntry::new(Some(" Domates "), None, Some(12.5)).unwrap();
        assert_eq!(e.product, "Domates");
        assert_eq!(e.unit, DEFAULT_UNIT);

        let e = PriceEntry::new(Some("Marul"), Some(" "), Some(8.0)).unwrap();
        assert_eq!(e.unit, DEFAULT_UNIT);
    }

    #[test]
    fn entry_keeps_zero_price() {
        let e = PriceEntry::new(Some("Limon"), Some("KG"), Some(0.0)).unwrap();
        assert_eq!(e.price, 0.0);
    }

    fn range(min: Option<f64>, max: Option<f64>) -> PriceRange {
        PriceRange {
            product: Some("Biber".into()),
            unit: Some("KG".into()),
            price_min: min,
            price_max: max,
        }
    }

    #[test]
    fn range_mean_of_both_bounds() {
        assert_eq!(range(Some(10.0), Some(20.0)).representative(), Some(15.0));
    }

    #[test]
    fn range_single_bound() {
        assert_eq!(range(Some(10.0), None).representative(), Some(10.0));
        assert_eq!(range(None, Some(20.0)).representative(), Some(20.0));
    }

    #[test]
    fn range_equal_bounds() {
        assert_eq!(range(Some(7.5), Some(7.5)).representative(), Some(7.5));
    }

    #[test]
    fn range_without_bounds_is_dropped() {
        assert!(range(None, None).into_entry().is_none());
    }

    #[test]
    fn range_without_product_is_dropped() {
        let mut r = range(Some(1.0), Some(2.0));
        r.product = None;
        assert!(r.into_entry().is_none());
    }

    #[test]
    fn city_id_is_canonical() {
        assert_eq!(CityId::new("İzmir").as_str(), "izmir");
        assert_eq!(CityId::new("IZMIR").as_str(), "izmir");
        assert_eq!(CityId::new("Izmir"), CityId::new("izmir"));
        assert_eq!(CityId::new(" Konya ").as_str(), "konya");
        assert_eq!(CityId::new("Şanlıurfa").as_str(), "sanliurfa");
    }

    #[test]
    fn city_id_serde_canonicalizes() {
        let id: CityId = serde_json::from_str("\"Muğla\"").unwrap();
        assert_eq!(id.as_str(), "mugla");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"mugla\"");
    }
}
