use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Current value of a user's holdings at `as_of`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// `quantity * price` for each asset that could be priced
    pub per_asset: BTreeMap<String, Decimal>,

    /// Sum of `per_asset`
    pub total: Decimal,

    /// Held assets with no price in this request. They contribute nothing
    /// to `total`, so a non-empty set means the total is incomplete.
    pub unpriceable: BTreeSet<String>,

    pub as_of: DateTime<Utc>,
}

impl ValuationResult {
    pub fn empty() -> Self {
        Self {
            per_asset: BTreeMap::new(),
            total: Decimal::ZERO,
            unpriceable: BTreeSet::new(),
            as_of: Utc::now(),
        }
    }

    /// `true` when every held asset was priced.
    pub fn is_complete(&self) -> bool {
        self.unpriceable.is_empty()
    }
}

/// Profit of the current portfolio against the recorded baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitSummary {
    pub user_id: String,

    /// Baseline recorded on the last update/reset
    pub initial_investment: Decimal,

    /// Live value of current holdings
    pub current_value: Decimal,

    /// `current_value - initial_investment`
    pub unrealized_profit: Decimal,

    /// `unrealized_profit / initial_investment * 100`, rounded to 2 places.
    /// `None` when there is no baseline to compare against.
    pub return_pct: Option<Decimal>,

    /// Last figure stored via `save_total_profit`
    pub recorded_total_profit: Decimal,

    pub unpriceable: BTreeSet<String>,

    pub as_of: DateTime<Utc>,
}
