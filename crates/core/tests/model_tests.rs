// ═══════════════════════════════════════════════════════════════════
// Model Tests — Holding, InvestmentRecord, AssetPrice, ValuationResult,
// Settings
// ═══════════════════════════════════════════════════════════════════

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::time::Duration;

use investment_tracker_core::errors::CoreError;
use investment_tracker_core::models::holding::{normalize_asset_id, Holding};
use investment_tracker_core::models::investment::InvestmentRecord;
use investment_tracker_core::models::price::{to_quotes, AssetPrice, PriceMap};
use investment_tracker_core::models::settings::{
    validate_currency, Settings, ENV_API_BASE_URL, ENV_BASE_CURRENCY, ENV_REQUEST_TIMEOUT_SECS,
};
use investment_tracker_core::models::valuation::ValuationResult;

// ═══════════════════════════════════════════════════════════════════
// Holding
// ═══════════════════════════════════════════════════════════════════

mod holding {
    use super::*;

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_asset_id("  btc "), "BTC");
        assert_eq!(normalize_asset_id("Eth"), "ETH");
        assert_eq!(normalize_asset_id("   "), "");
    }

    #[test]
    fn new_normalizes_asset_id() {
        let h = Holding::new("sol", dec!(12.5));
        assert_eq!(h.asset_id, "SOL");
        assert_eq!(h.quantity, dec!(12.5));
    }

    #[test]
    fn display() {
        assert_eq!(Holding::new("btc", dec!(0.25)).to_string(), "BTC=0.25");
    }

    #[test]
    fn parse_asset_equals_quantity() {
        let h: Holding = "eth=2.75".parse().unwrap();
        assert_eq!(h, Holding::new("ETH", dec!(2.75)));
    }

    #[test]
    fn parse_tolerates_whitespace_around_quantity() {
        let h: Holding = "btc= 1 ".parse().unwrap();
        assert_eq!(h.quantity, dec!(1));
    }

    #[test]
    fn parse_rejects_missing_separator() {
        let err = "BTC1".parse::<Holding>().unwrap_err();
        assert!(err.contains("ASSET=QUANTITY"));
    }

    #[test]
    fn parse_rejects_bad_quantity() {
        let err = "BTC=lots".parse::<Holding>().unwrap_err();
        assert!(err.contains("invalid quantity"));
    }

    #[test]
    fn equality_is_numeric_for_quantity() {
        assert_eq!(Holding::new("BTC", dec!(1.50)), Holding::new("BTC", dec!(1.5)));
    }

    #[test]
    fn serde_roundtrip_keeps_decimal_precision() {
        let h = Holding::new("BTC", dec!(0.12345678));
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.contains("\"0.12345678\""));
        let back: Holding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}

// ═══════════════════════════════════════════════════════════════════
// InvestmentRecord
// ═══════════════════════════════════════════════════════════════════

mod investment_record {
    use super::*;

    #[test]
    fn new_record_is_empty_with_zero_baseline() {
        let r = InvestmentRecord::new("alice");
        assert_eq!(r.user_id, "alice");
        assert!(r.holdings.is_empty());
        assert_eq!(r.initial_investment, Decimal::ZERO);
        assert_eq!(r.total_profit, Decimal::ZERO);
    }

    #[test]
    fn holding_lookup() {
        let mut r = InvestmentRecord::new("alice");
        r.holdings.push(Holding::new("BTC", dec!(1)));
        assert_eq!(r.holding("BTC").map(|h| h.quantity), Some(dec!(1)));
        assert!(r.holding("ETH").is_none());
    }

    #[test]
    fn asset_ids_are_distinct_and_sorted() {
        let mut r = InvestmentRecord::new("alice");
        r.holdings.push(Holding::new("ETH", dec!(1)));
        r.holdings.push(Holding::new("BTC", dec!(1)));
        let ids: Vec<String> = r.asset_ids().into_iter().collect();
        assert_eq!(ids, vec!["BTC".to_string(), "ETH".to_string()]);
        assert!(!r.has_duplicate_assets());
    }

    #[test]
    fn detects_duplicates() {
        let mut r = InvestmentRecord::new("alice");
        r.holdings.push(Holding::new("BTC", dec!(1)));
        r.holdings.push(Holding::new("btc", dec!(2)));
        assert!(r.has_duplicate_assets());
    }
}

// ═══════════════════════════════════════════════════════════════════
// AssetPrice / PriceMap
// ═══════════════════════════════════════════════════════════════════

mod asset_price {
    use super::*;

    #[test]
    fn priced_accessors() {
        let p = AssetPrice::Priced(dec!(50000));
        assert_eq!(p.price(), Some(dec!(50000)));
        assert!(p.is_available());
        assert_eq!(p.to_string(), "50000");
    }

    #[test]
    fn unavailable_accessors() {
        let p = AssetPrice::Unavailable;
        assert_eq!(p.price(), None);
        assert!(!p.is_available());
        assert_eq!(p.to_string(), "unavailable");
    }

    #[test]
    fn json_shape() {
        let priced = serde_json::to_value(AssetPrice::Priced(dec!(1.5))).unwrap();
        assert_eq!(priced, serde_json::json!({"status": "priced", "price": "1.5"}));

        let unavailable = serde_json::to_value(AssetPrice::Unavailable).unwrap();
        assert_eq!(unavailable, serde_json::json!({"status": "unavailable"}));
    }

    #[test]
    fn to_quotes_is_ordered_by_asset() {
        let mut prices = PriceMap::new();
        prices.insert("ETH".into(), AssetPrice::Priced(dec!(3000)));
        prices.insert("BTC".into(), AssetPrice::Unavailable);

        let quotes = to_quotes(&prices);
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].asset_id, "BTC");
        assert_eq!(quotes[0].price, AssetPrice::Unavailable);
        assert_eq!(quotes[1].asset_id, "ETH");
        assert_eq!(quotes[1].price, AssetPrice::Priced(dec!(3000)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// ValuationResult
// ═══════════════════════════════════════════════════════════════════

mod valuation_result {
    use super::*;

    #[test]
    fn empty_is_zero_and_complete() {
        let v = ValuationResult::empty();
        assert_eq!(v.total, Decimal::ZERO);
        assert!(v.per_asset.is_empty());
        assert!(v.is_complete());
    }

    #[test]
    fn unpriceable_marks_incomplete() {
        let mut v = ValuationResult::empty();
        v.unpriceable.insert("XYZ".into());
        assert!(!v.is_complete());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.base_currency, "USD");
        assert_eq!(s.api_base_url, "https://api.coinbase.com");
        assert_eq!(s.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn no_variables_gives_defaults() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn variables_override_defaults() {
        let s = Settings::from_lookup(lookup(&[
            (ENV_BASE_CURRENCY, "eur"),
            (ENV_API_BASE_URL, "http://localhost:8080/"),
            (ENV_REQUEST_TIMEOUT_SECS, "3"),
        ]))
        .unwrap();
        assert_eq!(s.base_currency, "EUR");
        assert_eq!(s.api_base_url, "http://localhost:8080");
        assert_eq!(s.request_timeout_secs, 3);
    }

    #[test]
    fn invalid_currency_rejected() {
        let err = Settings::from_lookup(lookup(&[(ENV_BASE_CURRENCY, "EURO")])).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn non_numeric_timeout_rejected() {
        let err =
            Settings::from_lookup(lookup(&[(ENV_REQUEST_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(ref m) if m.contains("soon")));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = Settings::from_lookup(lookup(&[(ENV_REQUEST_TIMEOUT_SECS, "0")])).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn empty_base_url_rejected() {
        let err = Settings::from_lookup(lookup(&[(ENV_API_BASE_URL, " / ")])).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn validate_currency_cases() {
        assert_eq!(validate_currency(" usd ").unwrap(), "USD");
        assert!(validate_currency("US").is_err());
        assert!(validate_currency("U5D").is_err());
    }

    #[test]
    fn deserializes_partial_config_with_defaults() {
        let s: Settings = serde_json::from_str(r#"{"base_currency":"GBP"}"#).unwrap();
        assert_eq!(s.base_currency, "GBP");
        assert_eq!(s.request_timeout_secs, 10);
    }
}
