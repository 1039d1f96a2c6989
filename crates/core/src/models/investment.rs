use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::holding::Holding;

/// Everything persisted for one user: holdings, the baseline they were
/// valued at when last established, and the last recorded total profit.
///
/// Services never mutate a stored record in place. They read a snapshot,
/// build a new record, and hand the whole thing back to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRecord {
    pub user_id: String,

    /// Held assets in insertion order. No two entries share an `asset_id`.
    pub holdings: Vec<Holding>,

    /// Portfolio value at the moment holdings were last updated or reset.
    pub initial_investment: Decimal,

    /// Last profit figure saved by the caller.
    pub total_profit: Decimal,

    pub updated_at: DateTime<Utc>,
}

impl InvestmentRecord {
    /// A freshly registered user: no holdings, zero baseline, zero profit.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            holdings: Vec::new(),
            initial_investment: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    pub fn holding(&self, asset_id: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.asset_id == asset_id)
    }

    /// Distinct asset ids across all holdings.
    pub fn asset_ids(&self) -> BTreeSet<String> {
        self.holdings.iter().map(|h| h.asset_id.clone()).collect()
    }

    pub fn has_duplicate_assets(&self) -> bool {
        self.asset_ids().len() != self.holdings.len()
    }
}
