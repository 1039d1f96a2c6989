use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::traits::PriceSource;
use crate::errors::CoreError;
use crate::models::settings::Settings;

const PROVIDER: &str = "Coinbase";

/// Decimal places kept when inverting exchange rates into prices.
const PRICE_SCALE: u32 = 8;

/// Coinbase public API provider for spot prices.
///
/// - **Free**: No API key required for the public price endpoints.
/// - **Batch**: `/v2/exchange-rates?currency={BASE}` returns how many units
///   of every known asset one unit of the base currency buys. Price is the
///   inverse of that rate.
/// - **Single**: `/v2/prices/{ASSET}-{BASE}/spot` returns one spot price.
///   A 404/400 here means Coinbase does not know the pair.
pub struct CoinbaseProvider {
    client: Client,
    base_url: String,
    base_currency: String,
}

impl CoinbaseProvider {
    pub fn new(settings: &Settings) -> Self {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            base_currency: settings.base_currency.to_uppercase(),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// URL of the batch exchange-rates endpoint.
    pub fn exchange_rates_url(&self) -> String {
        format!("{}/v2/exchange-rates?currency={}", self.base_url, self.base_currency)
    }

    /// URL of the single-pair spot endpoint, e.g. `.../v2/prices/BTC-USD/spot`.
    pub fn spot_url(&self, asset_id: &str) -> String {
        format!(
            "{}/v2/prices/{}-{}/spot",
            self.base_url, asset_id, self.base_currency
        )
    }

    async fn quote_batch(
        &self,
        asset_ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, Decimal>, CoreError> {
        let url = self.exchange_rates_url();
        debug!(assets = asset_ids.len(), "Requesting Coinbase exchange rates");

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Exchange rates request failed with status {}", resp.status()),
            });
        }
        let body = resp.text().await?;
        parse_exchange_rates(&body, asset_ids)
    }

    async fn quote_single(&self, asset_id: &str) -> Result<HashMap<String, Decimal>, CoreError> {
        let url = self.spot_url(asset_id);
        debug!(asset_id, "Requesting Coinbase spot price");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
            // Unknown pair: omit it, the fetcher marks it unavailable.
            return Ok(HashMap::new());
        }
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Spot price request for {asset_id} failed with status {status}"),
            });
        }
        let body = resp.text().await?;
        let price = parse_spot_price(&body)?;

        let mut prices = HashMap::new();
        prices.insert(asset_id.to_string(), price);
        Ok(prices)
    }
}

// ── Coinbase API response types ─────────────────────────────────────

#[derive(Deserialize)]
struct ExchangeRatesResponse {
    data: ExchangeRatesData,
}

#[derive(Deserialize)]
struct ExchangeRatesData {
    rates: HashMap<String, String>,
}

#[derive(Deserialize)]
struct SpotResponse {
    data: SpotData,
}

#[derive(Deserialize)]
struct SpotData {
    amount: String,
}

/// Extract prices for `asset_ids` from an exchange-rates body.
///
/// Ids missing from the body, or whose rate is zero, negative or not a
/// number, are left out of the result.
pub fn parse_exchange_rates(
    body: &str,
    asset_ids: &BTreeSet<String>,
) -> Result<HashMap<String, Decimal>, CoreError> {
    let resp: ExchangeRatesResponse = serde_json::from_str(body).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Failed to parse exchange rates: {e}"),
    })?;

    let prices = asset_ids
        .iter()
        .filter_map(|id| {
            let rate: Decimal = resp.data.rates.get(id)?.trim().parse().ok()?;
            if rate <= Decimal::ZERO {
                return None;
            }
            let price = Decimal::ONE.checked_div(rate)?.round_dp(PRICE_SCALE).normalize();
            Some((id.clone(), price))
        })
        .collect();

    Ok(prices)
}

/// Extract the price from a spot-price body.
pub fn parse_spot_price(body: &str) -> Result<Decimal, CoreError> {
    let resp: SpotResponse = serde_json::from_str(body).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Failed to parse spot price: {e}"),
    })?;

    resp.data
        .amount
        .trim()
        .parse()
        .map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Invalid price format '{}': {e}", resp.data.amount),
        })
}

#[async_trait]
impl PriceSource for CoinbaseProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn quote(
        &self,
        asset_ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, Decimal>, CoreError> {
        // The base currency has no spot pair with itself; it is worth 1 on
        // both paths.
        let others: BTreeSet<String> = asset_ids
            .iter()
            .filter(|id| **id != self.base_currency)
            .cloned()
            .collect();

        let mut ids = others.iter();
        let mut prices = match (ids.next(), ids.next()) {
            (None, _) => HashMap::new(),
            (Some(only), None) => self.quote_single(only).await?,
            _ => self.quote_batch(&others).await?,
        };
        if others.len() < asset_ids.len() {
            prices.insert(self.base_currency.clone(), Decimal::ONE);
        }
        Ok(prices)
    }
}
