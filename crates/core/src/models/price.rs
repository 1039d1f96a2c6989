use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of looking up one asset's spot price.
///
/// `Unavailable` is a normal result, not an error: the asset could not be
/// priced in this request and is left out of totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "price", rename_all = "snake_case")]
pub enum AssetPrice {
    Priced(Decimal),
    Unavailable,
}

impl AssetPrice {
    pub fn price(&self) -> Option<Decimal> {
        match self {
            AssetPrice::Priced(p) => Some(*p),
            AssetPrice::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AssetPrice::Priced(_))
    }
}

impl std::fmt::Display for AssetPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetPrice::Priced(p) => write!(f, "{p}"),
            AssetPrice::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// A single asset's price as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub asset_id: String,
    pub price: AssetPrice,
}

/// Result of one fetch: every requested asset id maps to exactly one outcome.
pub type PriceMap = BTreeMap<String, AssetPrice>;

/// Flatten a [`PriceMap`] into quotes, ordered by asset id.
pub fn to_quotes(prices: &PriceMap) -> Vec<PriceQuote> {
    prices
        .iter()
        .map(|(asset_id, price)| PriceQuote {
            asset_id: asset_id.clone(),
            price: *price,
        })
        .collect()
}
