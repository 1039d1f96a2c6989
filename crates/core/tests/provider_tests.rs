// ═══════════════════════════════════════════════════════════════════
// Provider Tests — Coinbase URL building and response parsing
// ═══════════════════════════════════════════════════════════════════

use rust_decimal_macros::dec;
use std::collections::BTreeSet;

use investment_tracker_core::errors::CoreError;
use investment_tracker_core::models::settings::Settings;
use investment_tracker_core::providers::coinbase::{
    parse_exchange_rates, parse_spot_price, CoinbaseProvider,
};
use investment_tracker_core::providers::traits::PriceSource;

fn ids(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ═══════════════════════════════════════════════════════════════════
// CoinbaseProvider — construction & URLs
// ═══════════════════════════════════════════════════════════════════

mod coinbase_urls {
    use super::*;

    #[test]
    fn name() {
        let p = CoinbaseProvider::new(&Settings::default());
        assert_eq!(p.name(), "Coinbase");
    }

    #[test]
    fn spot_url_uses_base_currency() {
        let p = CoinbaseProvider::new(&Settings::default());
        assert_eq!(
            p.spot_url("BTC"),
            "https://api.coinbase.com/v2/prices/BTC-USD/spot"
        );
    }

    #[test]
    fn exchange_rates_url_uses_base_currency() {
        let settings = Settings {
            base_currency: "eur".into(),
            ..Settings::default()
        };
        let p = CoinbaseProvider::new(&settings);
        assert_eq!(p.base_currency(), "EUR");
        assert_eq!(
            p.exchange_rates_url(),
            "https://api.coinbase.com/v2/exchange-rates?currency=EUR"
        );
    }

    #[test]
    fn trailing_slash_on_base_url_is_dropped() {
        let settings = Settings {
            api_base_url: "http://127.0.0.1:9999/".into(),
            ..Settings::default()
        };
        let p = CoinbaseProvider::new(&settings);
        assert_eq!(p.spot_url("ETH"), "http://127.0.0.1:9999/v2/prices/ETH-USD/spot");
    }

    #[tokio::test]
    async fn base_currency_is_priced_at_one_without_a_request() {
        // Nothing listens here, so any HTTP call would fail the quote.
        let settings = Settings {
            base_currency: "EUR".into(),
            api_base_url: "http://127.0.0.1:9".into(),
            ..Settings::default()
        };
        let p = CoinbaseProvider::new(&settings);

        let prices = p.quote(&ids(&["EUR"])).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["EUR"], dec!(1));
    }

    #[tokio::test]
    async fn empty_request_returns_empty_map() {
        let p = CoinbaseProvider::new(&Settings::default());
        let prices = p.quote(&BTreeSet::new()).await.unwrap();
        assert!(prices.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Exchange rates parsing (batch endpoint)
// ═══════════════════════════════════════════════════════════════════

mod exchange_rates {
    use super::*;

    const BODY: &str = r#"{
        "data": {
            "currency": "USD",
            "rates": {
                "BTC": "0.00002",
                "ETH": "0.0005",
                "USDC": "1",
                "ZERO": "0",
                "NEG": "-0.1",
                "BAD": "not-a-number"
            }
        }
    }"#;

    #[test]
    fn inverts_rates_into_prices() {
        let prices = parse_exchange_rates(BODY, &ids(&["BTC", "ETH", "USDC"])).unwrap();
        assert_eq!(prices.len(), 3);
        assert_eq!(prices["BTC"], dec!(50000));
        assert_eq!(prices["ETH"], dec!(2000));
        assert_eq!(prices["USDC"], dec!(1));
    }

    #[test]
    fn only_requested_ids_are_returned() {
        let prices = parse_exchange_rates(BODY, &ids(&["BTC"])).unwrap();
        assert_eq!(prices.len(), 1);
        assert!(prices.contains_key("BTC"));
    }

    #[test]
    fn unknown_and_invalid_rates_are_omitted() {
        let prices =
            parse_exchange_rates(BODY, &ids(&["ZERO", "NEG", "BAD", "MISSING"])).unwrap();
        assert!(prices.is_empty());
    }

    #[test]
    fn inexact_inverse_is_rounded_to_eight_places() {
        let body = r#"{"data":{"currency":"USD","rates":{"XYZ":"3"}}}"#;
        let prices = parse_exchange_rates(body, &ids(&["XYZ"])).unwrap();
        assert_eq!(prices["XYZ"], dec!(0.33333333));
    }

    #[test]
    fn malformed_body_is_api_error() {
        let err = parse_exchange_rates("<html>oops</html>", &ids(&["BTC"])).unwrap_err();
        assert!(matches!(err, CoreError::Api { ref provider, .. } if provider == "Coinbase"));
    }

    #[test]
    fn missing_rates_field_is_api_error() {
        let err = parse_exchange_rates(r#"{"data":{"currency":"USD"}}"#, &ids(&["BTC"]))
            .unwrap_err();
        assert!(matches!(err, CoreError::Api { .. }));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Spot price parsing (single endpoint)
// ═══════════════════════════════════════════════════════════════════

mod spot_price {
    use super::*;

    #[test]
    fn parses_amount() {
        let body = r#"{"data":{"amount":"50123.45","base":"BTC","currency":"USD"}}"#;
        assert_eq!(parse_spot_price(body).unwrap(), dec!(50123.45));
    }

    #[test]
    fn invalid_amount_is_api_error() {
        let body = r#"{"data":{"amount":"n/a","base":"BTC","currency":"USD"}}"#;
        let err = parse_spot_price(body).unwrap_err();
        assert!(matches!(err, CoreError::Api { ref message, .. } if message.contains("n/a")));
    }

    #[test]
    fn error_body_is_api_error() {
        let body = r#"{"errors":[{"id":"not_found","message":"Invalid currency"}]}"#;
        assert!(matches!(parse_spot_price(body), Err(CoreError::Api { .. })));
    }
}
