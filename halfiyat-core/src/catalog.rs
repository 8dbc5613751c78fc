//! Built-in city catalog.
//!
//! Each city is one [`SourceSpec`]; the runner may replace or extend this list
//! from its TOML config without code changes.

use serde::{Deserialize, Serialize};

use crate::domain::CityId;
use crate::source::fields::{strings, FieldAliases};
use crate::source::{ColumnOrder, CsvDatasetSpec, HtmlTableSpec, JsonApiSpec, SourceSpec};

/// Cities fetched when no explicit list is configured.
pub const DEFAULT_RUN_CITIES: [&str; 2] = ["izmir", "konya"];

pub const IZMIR_API_URL: &str =
    "https://openapi.izmir.bel.tr/api/ibb/halfiyatlari/sebzemeyve/{date}";

pub const KONYA_CSV_URL: &str = "https://acikveri.konya.bel.tr/dataset/\
    0a341ce8-4369-4d91-93d7-a302298275ad/resource/\
    532c336b-b3b4-42f9-ae46-44d0597e3ff9/download/hal_fiyatlari.csv";

pub const ISTANBUL_API_URL: &str = "https://hal.ibb.gov.tr/api/v1/market-prices/wholesale";

/// One configured city: identifier, display name, and where its prices live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    pub id: CityId,
    /// Human-readable name for logs; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    pub source: SourceSpec,
}

impl CityConfig {
    pub fn new(id: &str, name: &str, source: SourceSpec) -> Self {
        Self {
            id: CityId::new(id),
            name: Some(name.to_string()),
            source,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

fn html_table(url: &str, columns: ColumnOrder) -> HtmlTableSpec {
    HtmlTableSpec {
        columns,
        ..HtmlTableSpec::new(url)
    }
}

/// Every city with a known source.
pub fn default_catalog() -> Vec<CityConfig> {
    let izmir = JsonApiSpec {
        fields: FieldAliases {
            product: strings(&["MAL_ADI", "mal_adi", "malAdi", "URUN_ADI", "urun_adi"]),
            unit: strings(&["BIRIM", "birim"]),
            price: strings(&[
                "ORTALAMA_UCRET",
                "ortalama_ucret",
                "ORTALAMA_FIYAT",
                "ortalama_fiyat",
            ]),
            price_min: Vec::new(),
            price_max: Vec::new(),
        },
        ..JsonApiSpec::new(IZMIR_API_URL)
    };

    let konya = CsvDatasetSpec {
        fields: FieldAliases {
            product: strings(&["urun_ad", "URUN_AD"]),
            unit: strings(&["birim", "BIRIM"]),
            price: Vec::new(),
            price_min: strings(&["en_dusuk_fiyat", "EN_DUSUK_FIYAT"]),
            price_max: strings(&["en_yuksek_fiyat", "EN_YUKSEK_FIYAT"]),
        },
        ..CsvDatasetSpec::new(KONYA_CSV_URL)
    };

    let istanbul = JsonApiSpec {
        fields: FieldAliases {
            product: strings(&["productName"]),
            unit: strings(&["unit"]),
            price: Vec::new(),
            price_min: strings(&["lowerPrice"]),
            price_max: strings(&["upperPrice"]),
        },
        timeout_secs: 15,
        ..JsonApiSpec::new(ISTANBUL_API_URL)
    };

    let kayseri = HtmlTableSpec {
        header_markers: strings(&["CİNSİ", "CINSI"]),
        timeout_secs: 20,
        ..HtmlTableSpec::new("https://www.kayseri.bel.tr/hal-fiyatlari")
    };

    vec![
        CityConfig::new("izmir", "İzmir", SourceSpec::JsonApi(izmir)),
        CityConfig::new("konya", "Konya", SourceSpec::CsvDataset(konya)),
        CityConfig::new("istanbul", "İstanbul", SourceSpec::JsonApi(istanbul)),
        CityConfig::new("kayseri", "Kayseri", SourceSpec::HtmlTable(kayseri)),
        CityConfig::new(
            "ankara",
            "Ankara",
            SourceSpec::HtmlTable(html_table(
                "https://www.ankara.bel.tr/hal-fiyatlari",
                ColumnOrder::LowHigh,
            )),
        ),
        CityConfig::new(
            "bursa",
            "Bursa",
            SourceSpec::HtmlTable(html_table(
                "https://www.bursa.bel.tr/hal-fiyatlari",
                ColumnOrder::LowHigh,
            )),
        ),
        CityConfig::new(
            "antalya",
            "Antalya",
            SourceSpec::HtmlTable(html_table(
                "https://antalya.bel.tr/hal-fiyatlari",
                ColumnOrder::LowHigh,
            )),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_and_canonical() {
        let catalog = default_catalog();
        let ids: HashSet<&str> = catalog.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
        for c in &catalog {
            assert_eq!(CityId::new(c.id.as_str()), c.id);
        }
    }

    #[test]
    fn default_run_cities_are_in_catalog() {
        let catalog = default_catalog();
        for id in DEFAULT_RUN_CITIES {
            assert!(catalog.iter().any(|c| c.id.as_str() == id), "{id} missing");
        }
    }

    #[test]
    fn konya_url_is_one_line() {
        assert!(!KONYA_CSV_URL.contains(char::is_whitespace));
        assert!(KONYA_CSV_URL.ends_with("/download/hal_fiyatlari.csv"));
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let mut c = default_catalog().remove(0);
        assert_eq!(c.display_name(), "İzmir");
        c.name = None;
        assert_eq!(c.display_name(), "izmir");
    }

    #[test]
    fn catalog_survives_toml_round_trip() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            cities: Vec<CityConfig>,
        }
        let original = Wrapper {
            cities: default_catalog(),
        };
        let text = toml::to_string(&original).unwrap();
        let parsed: Wrapper = toml::from_str(&text).unwrap();
        assert_eq!(parsed.cities, original.cities);
    }
}
