use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Normalize an asset identifier: trimmed and uppercased ("btc " → "BTC").
///
/// Every entry point (holdings, filters, fetcher input) goes through this,
/// so "btc" and "BTC" always refer to the same holding.
pub fn normalize_asset_id(asset_id: &str) -> String {
    asset_id.trim().to_uppercase()
}

/// A quantity of a single asset owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Asset identifier, uppercased (e.g., "BTC", "ETH")
    pub asset_id: String,

    /// Units held. Never negative; zero marks a closed position.
    pub quantity: Decimal,
}

impl Holding {
    pub fn new(asset_id: impl AsRef<str>, quantity: Decimal) -> Self {
        Self {
            asset_id: normalize_asset_id(asset_id.as_ref()),
            quantity,
        }
    }
}

impl std::fmt::Display for Holding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.asset_id, self.quantity)
    }
}

impl std::str::FromStr for Holding {
    type Err = String;

    /// Parse the `ASSET=QUANTITY` form used on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (asset, qty) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ASSET=QUANTITY, got '{s}'"))?;
        let quantity: Decimal = qty
            .trim()
            .parse()
            .map_err(|e| format!("invalid quantity '{qty}': {e}"))?;
        Ok(Holding::new(asset, quantity))
    }
}
