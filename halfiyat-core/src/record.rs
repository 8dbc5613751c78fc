//! Record building and stable product ids.
//!
//! The stable id is the storage key for a product, so it must be a pure
//! function of the product text: same name in, same id out, across runs and
//! across sources. Re-running a city for the same date therefore overwrites
//! the same documents instead of creating new ones.

use crate::domain::{CityId, FetchResult, PersistedRecord};

/// Lowercase and fold Turkish letters and separators to ASCII-safe characters.
///
/// Substitutions after lowercasing: `ğ→g ü→u ş→s ı→i ö→o ç→c`; whitespace,
/// `/` and `\` become `_`. The dotted capital `İ` lowers to a plain `i`
/// (plain `to_lowercase` would leave a combining dot behind).
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'İ' => out.push('i'),
            c if c.is_whitespace() || c == '/' || c == '\\' => out.push('_'),
            c => out.extend(c.to_lowercase().map(fold_turkish)),
        }
    }
    out
}

fn fold_turkish(c: char) -> char {
    match c {
        'ğ' => 'g',
        'ü' => 'u',
        'ş' => 's',
        'ı' => 'i',
        'ö' => 'o',
        'ç' => 'c',
        other => other,
    }
}

/// Storage-safe id for a product name.
pub fn stable_id(product: &str) -> String {
    transliterate(product)
}

/// Attach city, date and stable id to every entry, preserving input order.
pub fn build_records(city: &CityId, result: &FetchResult) -> Vec<PersistedRecord> {
    result
        .entries
        .iter()
        .map(|entry| PersistedRecord {
            product: entry.product.clone(),
            unit: entry.unit.clone(),
            price: entry.price,
            city: city.to_string(),
            date: result.effective_date,
            stable_id: stable_id(&entry.product),
        })
        .collect()
}
