//! Property tests for the normalizer, price ranges and stable ids.
//!
//! 1. Normalization is idempotent on its own formatted output
//! 2. Turkish-formatted amounts (`1.234,56`) read back to the same value
//! 3. A range's representative price lies between its bounds
//! 4. Stable ids are deterministic, ASCII, separator-free and idempotent

use halfiyat_core::{normalize, stable_id, PriceRange};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (0.0..10_000_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

/// `1234567` → `1.234.567`
fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        groups.push(n % 1000);
        n /= 1000;
        if n == 0 {
            break;
        }
    }
    let mut out = groups.pop().unwrap_or(0).to_string();
    while let Some(g) = groups.pop() {
        out.push_str(&format!(".{g:03}"));
    }
    out
}

// ── 1. Idempotence ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn normalize_is_idempotent_on_its_output(price in arb_price()) {
        let once = normalize(price.to_string().as_str());
        prop_assert_eq!(once, Some(price));
        let twice = once.and_then(|v| normalize(v.to_string().as_str()));
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn numbers_pass_through(price in arb_price()) {
        prop_assert_eq!(normalize(price), Some(price));
    }
}

// ── 2. Turkish formatting ────────────────────────────────────────────

proptest! {
    #[test]
    fn turkish_grouping_reads_back(whole in 0u64..100_000_000, cents in 0u64..100) {
        let text = format!("{},{:02}", group_thousands(whole), cents);
        let expected = whole as f64 + cents as f64 / 100.0;
        let got = normalize(text.as_str());
        prop_assert!(got.is_some(), "{} did not parse", text);
        prop_assert!((got.unwrap() - expected).abs() < 1e-6, "{} → {:?}", text, got);
    }

    #[test]
    fn currency_decorations_are_ignored(whole in 0u64..100_000, cents in 0u64..100) {
        let bare = format!("{whole},{cents:02}");
        let decorated = format!(" {bare} TL");
        prop_assert_eq!(normalize(decorated.as_str()), normalize(bare.as_str()));
    }
}

// ── 3. Range representative ──────────────────────────────────────────

proptest! {
    #[test]
    fn representative_lies_between_bounds(a in arb_price(), b in arb_price()) {
        let range = PriceRange {
            product: Some("Domates".into()),
            unit: None,
            price_min: Some(a.min(b)),
            price_max: Some(a.max(b)),
        };
        let rep = range.representative().unwrap();
        prop_assert!(rep >= a.min(b) && rep <= a.max(b));
    }
}

// ── 4. Stable ids ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn stable_id_is_ascii_and_separator_free(product in "[A-Za-zÇĞİÖŞÜçğıöşü0-9 /\\\\()-]{0,40}") {
        let id = stable_id(&product);
        prop_assert!(id.is_ascii(), "{:?} → {:?}", product, id);
        prop_assert!(!id.contains(char::is_whitespace));
        prop_assert!(!id.contains('/') && !id.contains('\\'));
        prop_assert!(!id.chars().any(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn stable_id_is_deterministic_and_idempotent(product in "[A-Za-zÂÎÛâîûÇĞİÖŞÜçğıöşü0-9 ,./\\\\\t-]{0,40}") {
        let id = stable_id(&product);
        prop_assert_eq!(&stable_id(&product), &id);
        prop_assert_eq!(stable_id(&id), id);
    }
}
