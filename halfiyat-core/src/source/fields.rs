//! Field-alias probing over raw source rows.
//!
//! Sources rename their columns without notice (`MAL_ADI`, `mal_adi`,
//! `malAdi`...). A [`FieldAliases`] lists the accepted names per field in
//! precedence order; the first alias holding a non-blank value wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{PriceEntry, PriceRange};
use crate::normalize::{normalize, PriceInput};

/// A raw row from any source: field name in, raw value out.
pub trait RawSourceRow {
    /// Value under `key`, or [`PriceInput::Missing`] when absent or null.
    fn value(&self, key: &str) -> PriceInput<'_>;
}

impl RawSourceRow for Map<String, Value> {
    fn value(&self, key: &str) -> PriceInput<'_> {
        self.get(key).map_or(PriceInput::Missing, PriceInput::from)
    }
}

/// Accepted field names, each list in precedence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAliases {
    pub product: Vec<String>,
    pub unit: Vec<String>,
    /// Average price. When one resolves, the range fields are ignored.
    pub price: Vec<String>,
    pub price_min: Vec<String>,
    pub price_max: Vec<String>,
}

impl Default for FieldAliases {
    /// The spellings seen across Turkish municipal open-data portals.
    fn default() -> Self {
        Self {
            product: strings(&[
                "MAL_ADI", "mal_adi", "malAdi", "URUN_ADI", "urun_adi", "urun_ad", "URUN_AD",
            ]),
            unit: strings(&["BIRIM", "birim"]),
            price: strings(&[
                "ORTALAMA_UCRET",
                "ortalama_ucret",
                "ORTALAMA_FIYAT",
                "ortalama_fiyat",
            ]),
            price_min: strings(&["en_dusuk_fiyat", "EN_DUSUK_FIYAT", "ASGARI_UCRET", "asgari_ucret"]),
            price_max: strings(&["en_yuksek_fiyat", "EN_YUKSEK_FIYAT", "AZAMI_UCRET", "azami_ucret"]),
        }
    }
}

pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn is_present(value: &PriceInput<'_>) -> bool {
    match value {
        PriceInput::Missing => false,
        PriceInput::Text(s) => !s.trim().is_empty(),
        PriceInput::Number(_) => true,
    }
}

/// First alias holding a non-blank value, rendered as text.
pub fn first_text<R: RawSourceRow + ?Sized>(row: &R, aliases: &[String]) -> Option<String> {
    aliases
        .iter()
        .map(|key| row.value(key))
        .find(is_present)
        .map(|value| match value {
            PriceInput::Text(s) => s.trim().to_string(),
            PriceInput::Number(n) => n.to_string(),
            PriceInput::Missing => String::new(),
        })
}

/// Normalized price from the first alias holding a non-blank value.
///
/// The first present alias wins even when it fails to parse; later aliases are
/// not consulted for a value that is there but unreadable.
pub fn first_price<R: RawSourceRow + ?Sized>(row: &R, aliases: &[String]) -> Option<f64> {
    aliases
        .iter()
        .map(|key| row.value(key))
        .find(is_present)
        .and_then(|value| normalize(value))
}

/// Resolve a raw row into an entry: average price if present, otherwise the
/// low/high range rule.
pub fn resolve_row<R: RawSourceRow + ?Sized>(row: &R, fields: &FieldAliases) -> Option<PriceEntry> {
    let product = first_text(row, &fields.product);
    let unit = first_text(row, &fields.unit);

    if let Some(price) = first_price(row, &fields.price) {
        return PriceEntry::new(product.as_deref(), unit.as_deref(), Some(price));
    }

    PriceRange {
        product,
        unit,
        price_min: first_price(row, &fields.price_min),
        price_max: first_price(row, &fields.price_max),
    }
    .into_entry()
}
