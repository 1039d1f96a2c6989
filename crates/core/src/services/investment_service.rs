use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::price_fetcher::PriceFetcher;
use super::user_locks::UserLocks;
use super::valuation_service::value_holdings;
use super::{load_record, store_record, validate_user_id};
use crate::errors::CoreError;
use crate::models::holding::{normalize_asset_id, Holding};
use crate::models::investment::InvestmentRecord;
use crate::models::price::PriceMap;
use crate::storage::traits::InvestmentStore;

/// Create/update/reset operations on a user's investment record.
///
/// Every write runs read → fetch → compute → write while holding that
/// user's lock, so a merge can never be applied on top of a snapshot that a
/// concurrent reset has already replaced. A failed fetch or store write
/// leaves the stored record untouched.
pub struct InvestmentService {
    store: Arc<dyn InvestmentStore>,
    fetcher: Arc<PriceFetcher>,
    locks: UserLocks,
}

impl InvestmentService {
    pub fn new(store: Arc<dyn InvestmentStore>, fetcher: Arc<PriceFetcher>) -> Self {
        Self {
            store,
            fetcher,
            locks: UserLocks::new(),
        }
    }

    /// Create an empty record for a new user.
    #[instrument(skip(self))]
    pub async fn register_user(&self, user_id: &str) -> Result<InvestmentRecord, CoreError> {
        validate_user_id(user_id)?;
        let _guard = self.locks.lock(user_id).await;

        if self.store.get(user_id).await?.is_some() {
            return Err(CoreError::ValidationError(format!(
                "User '{user_id}' is already registered"
            )));
        }

        let record = InvestmentRecord::new(user_id);
        store_record(self.store.as_ref(), record.clone()).await?;
        info!("Registered user");
        Ok(record)
    }

    pub async fn get_user_init_investment(&self, user_id: &str) -> Result<Decimal, CoreError> {
        Ok(load_record(self.store.as_ref(), user_id).await?.initial_investment)
    }

    /// Current holdings in stored order. An empty list is a valid answer.
    pub async fn get_all_investments(&self, user_id: &str) -> Result<Vec<Holding>, CoreError> {
        Ok(load_record(self.store.as_ref(), user_id).await?.holdings)
    }

    /// Add `new_holdings` onto the stored ones and re-baseline.
    ///
    /// Existing assets have their quantity increased; new assets are
    /// appended. Returns the new initial investment.
    #[instrument(skip(self, new_holdings), fields(changes = new_holdings.len()))]
    pub async fn update_init_investment(
        &self,
        user_id: &str,
        new_holdings: Vec<Holding>,
    ) -> Result<Decimal, CoreError> {
        validate_user_id(user_id)?;
        let _guard = self.locks.lock(user_id).await;

        let record = load_record(self.store.as_ref(), user_id).await?;
        let holdings = merge_holdings(&record.holdings, &new_holdings)?;
        self.commit_holdings(record, holdings).await
    }

    /// Replace the stored holdings with `new_holdings` and re-baseline.
    ///
    /// Duplicate assets in the input collapse to the last value given.
    /// Returns the new initial investment.
    #[instrument(skip(self, new_holdings), fields(holdings = new_holdings.len()))]
    pub async fn reset_init_investment(
        &self,
        user_id: &str,
        new_holdings: Vec<Holding>,
    ) -> Result<Decimal, CoreError> {
        validate_user_id(user_id)?;
        let _guard = self.locks.lock(user_id).await;

        let record = load_record(self.store.as_ref(), user_id).await?;
        let holdings = replace_holdings(&record.holdings, &new_holdings)?;
        self.commit_holdings(record, holdings).await
    }

    /// Overwrite the recorded total profit and echo back what was stored.
    #[instrument(skip(self))]
    pub async fn save_total_profit(
        &self,
        user_id: &str,
        total_profit: Decimal,
    ) -> Result<Decimal, CoreError> {
        validate_user_id(user_id)?;
        let _guard = self.locks.lock(user_id).await;

        let mut record = load_record(self.store.as_ref(), user_id).await?;
        record.total_profit = total_profit;
        record.updated_at = Utc::now();
        let stored = record.total_profit;
        store_record(self.store.as_ref(), record).await?;

        info!(%stored, "Saved total profit");
        Ok(stored)
    }

    /// Price `holdings` once, store them with the resulting baseline, and
    /// return the baseline. Nothing is written if pricing fails.
    async fn commit_holdings(
        &self,
        mut record: InvestmentRecord,
        holdings: Vec<Holding>,
    ) -> Result<Decimal, CoreError> {
        let prices = if holdings.is_empty() {
            PriceMap::new()
        } else {
            self.fetcher
                .fetch_prices(holdings.iter().map(|h| h.asset_id.as_str()))
                .await?
        };
        let baseline = value_holdings(&holdings, &prices);
        debug!(
            total = %baseline.total,
            unpriceable = ?baseline.unpriceable,
            "Computed baseline"
        );

        record.holdings = holdings;
        record.initial_investment = baseline.total;
        record.updated_at = Utc::now();
        let initial_investment = record.initial_investment;
        store_record(self.store.as_ref(), record).await?;

        info!(%initial_investment, "Committed holdings");
        Ok(initial_investment)
    }
}

/// Apply a merge delta to `existing`.
///
/// Quantities for assets already held are added together; unknown assets are
/// appended in the order first seen. Duplicates inside `delta` are summed.
pub fn merge_holdings(existing: &[Holding], delta: &[Holding]) -> Result<Vec<Holding>, CoreError> {
    let held: BTreeSet<&str> = existing.iter().map(|h| h.asset_id.as_str()).collect();
    let mut merged = existing.to_vec();

    for change in delta {
        let change = validate_holding(change, &held)?;
        match merged.iter_mut().find(|h| h.asset_id == change.asset_id) {
            Some(holding) => {
                holding.quantity = holding
                    .quantity
                    .checked_add(change.quantity)
                    .ok_or_else(|| {
                        CoreError::ValidationError(format!(
                            "Quantity for {} overflows when adding {}",
                            change.asset_id, change.quantity
                        ))
                    })?;
            }
            None => merged.push(change),
        }
    }

    Ok(merged)
}

/// Build the replacement holdings for a reset.
///
/// Duplicates inside `new_holdings` keep the position of their first
/// occurrence and the quantity of their last. `existing` is only consulted
/// to decide whether a zero quantity is allowed.
pub fn replace_holdings(
    existing: &[Holding],
    new_holdings: &[Holding],
) -> Result<Vec<Holding>, CoreError> {
    let held: BTreeSet<&str> = existing.iter().map(|h| h.asset_id.as_str()).collect();
    let mut replaced: Vec<Holding> = Vec::with_capacity(new_holdings.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for holding in new_holdings {
        let holding = validate_holding(holding, &held)?;
        match positions.get(&holding.asset_id) {
            Some(&idx) => replaced[idx].quantity = holding.quantity,
            None => {
                positions.insert(holding.asset_id.clone(), replaced.len());
                replaced.push(holding);
            }
        }
    }

    Ok(replaced)
}

/// Normalize one input holding and check it against the rules:
/// - asset id must not be blank
/// - quantity must not be negative
/// - zero is only meaningful for an asset that is already held
fn validate_holding(holding: &Holding, held: &BTreeSet<&str>) -> Result<Holding, CoreError> {
    let asset_id = normalize_asset_id(&holding.asset_id);
    if asset_id.is_empty() {
        return Err(CoreError::ValidationError(
            "Asset id must not be empty".into(),
        ));
    }
    if holding.quantity < Decimal::ZERO {
        return Err(CoreError::ValidationError(format!(
            "Quantity for {asset_id} must not be negative, got {}",
            holding.quantity
        )));
    }
    if holding.quantity.is_zero() && !held.contains(asset_id.as_str()) {
        return Err(CoreError::ValidationError(format!(
            "Quantity for {asset_id} is zero but {asset_id} is not currently held"
        )));
    }
    Ok(Holding {
        asset_id,
        quantity: holding.quantity,
    })
}
