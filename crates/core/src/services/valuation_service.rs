use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::load_record;
use super::price_fetcher::PriceFetcher;
use crate::errors::CoreError;
use crate::models::holding::{normalize_asset_id, Holding};
use crate::models::price::{AssetPrice, PriceMap};
use crate::models::valuation::{ProfitSummary, ValuationResult};
use crate::storage::traits::InvestmentStore;

/// Values stored holdings against live prices.
///
/// Read-only: never writes to the store and takes no per-user lock. Each
/// call works on one record snapshot and one set of fetched prices.
pub struct ValuationService {
    store: Arc<dyn InvestmentStore>,
    fetcher: Arc<PriceFetcher>,
}

impl ValuationService {
    pub fn new(store: Arc<dyn InvestmentStore>, fetcher: Arc<PriceFetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Per-asset values, total and unpriceable assets for the user's holdings.
    /// Empty holdings value to zero without a price lookup.
    #[instrument(skip(self))]
    pub async fn valuate(&self, user_id: &str) -> Result<ValuationResult, CoreError> {
        let record = load_record(self.store.as_ref(), user_id).await?;
        if record.holdings.is_empty() {
            debug!("No holdings, skipping price lookup");
            return Ok(ValuationResult::empty());
        }

        let prices = self.fetcher.fetch_prices(record.asset_ids()).await?;
        let result = value_holdings(&record.holdings, &prices);
        if !result.is_complete() {
            warn!(
                unpriceable = ?result.unpriceable,
                "Valuation is incomplete"
            );
        }
        Ok(result)
    }

    /// Sum of `quantity * price` over every priced holding.
    pub async fn current_price_totals(&self, user_id: &str) -> Result<Decimal, CoreError> {
        Ok(self.valuate(user_id).await?.total)
    }

    /// Spot price for each held asset, optionally narrowed to `filter`.
    ///
    /// Filter ids that the user does not hold are ignored. Unpriceable
    /// assets come back as `AssetPrice::Unavailable`.
    #[instrument(skip(self))]
    pub async fn get_current_prices(
        &self,
        user_id: &str,
        filter: Option<&[String]>,
    ) -> Result<PriceMap, CoreError> {
        let record = load_record(self.store.as_ref(), user_id).await?;
        let mut universe = record.asset_ids();
        if let Some(filter) = filter {
            let wanted: BTreeSet<String> = filter.iter().map(|id| normalize_asset_id(id)).collect();
            universe.retain(|id| wanted.contains(id));
        }
        if universe.is_empty() {
            return Ok(PriceMap::new());
        }

        self.fetcher.fetch_prices(universe).await
    }

    /// Live value against the recorded baseline.
    #[instrument(skip(self))]
    pub async fn profit_summary(&self, user_id: &str) -> Result<ProfitSummary, CoreError> {
        let record = load_record(self.store.as_ref(), user_id).await?;
        let valuation = if record.holdings.is_empty() {
            ValuationResult::empty()
        } else {
            let prices = self.fetcher.fetch_prices(record.asset_ids()).await?;
            value_holdings(&record.holdings, &prices)
        };

        let unrealized_profit = valuation.total - record.initial_investment;
        let return_pct = if record.initial_investment.is_zero() {
            None
        } else {
            unrealized_profit
                .checked_div(record.initial_investment)
                .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
                .map(|pct| pct.round_dp(2))
        };

        Ok(ProfitSummary {
            user_id: record.user_id,
            initial_investment: record.initial_investment,
            current_value: valuation.total,
            unrealized_profit,
            return_pct,
            recorded_total_profit: record.total_profit,
            unpriceable: valuation.unpriceable,
            as_of: valuation.as_of,
        })
    }
}

/// Value `holdings` with an already fetched price snapshot.
///
/// Holdings without a price (absent from `prices` or `Unavailable`) add
/// nothing to the total and are listed in `unpriceable`. So is a holding
/// whose value does not fit in a `Decimal`.
pub fn value_holdings(holdings: &[Holding], prices: &PriceMap) -> ValuationResult {
    let mut result = ValuationResult::empty();

    for holding in holdings {
        let price = match prices.get(&holding.asset_id).copied() {
            Some(AssetPrice::Priced(price)) => price,
            _ => {
                result.unpriceable.insert(holding.asset_id.clone());
                continue;
            }
        };

        let accumulated = result
            .per_asset
            .get(&holding.asset_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let valued = holding.quantity.checked_mul(price).and_then(|value| {
            Some((accumulated.checked_add(value)?, result.total.checked_add(value)?))
        });

        match valued {
            Some((per_asset, total)) => {
                result.per_asset.insert(holding.asset_id.clone(), per_asset);
                result.total = total;
            }
            None => {
                warn!(
                    asset_id = %holding.asset_id,
                    quantity = %holding.quantity,
                    %price,
                    "Holding value overflows, treating as unpriceable"
                );
                result.unpriceable.insert(holding.asset_id.clone());
            }
        }
    }

    result.as_of = Utc::now();
    result
}
