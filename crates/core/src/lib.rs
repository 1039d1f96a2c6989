pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use rust_decimal::Decimal;
use std::sync::Arc;

use errors::CoreError;
use models::{
    holding::Holding,
    investment::InvestmentRecord,
    price::PriceMap,
    settings::Settings,
    valuation::{ProfitSummary, ValuationResult},
};
use providers::{coinbase::CoinbaseProvider, traits::PriceSource};
use services::{
    investment_service::InvestmentService, price_fetcher::PriceFetcher,
    valuation_service::ValuationService,
};
use storage::traits::InvestmentStore;

/// Main entry point for the Investment Tracker core library.
///
/// Wires one store and one price source into the lifecycle and valuation
/// services. Cheap to share: wrap it in an `Arc` and call it from as many
/// tasks as needed.
#[must_use]
pub struct InvestmentTracker {
    settings: Settings,
    fetcher: Arc<PriceFetcher>,
    investment_service: InvestmentService,
    valuation_service: ValuationService,
}

impl std::fmt::Debug for InvestmentTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvestmentTracker")
            .field("settings", &self.settings)
            .field("price_source", &self.fetcher.source_name())
            .finish()
    }
}

impl InvestmentTracker {
    /// Build a tracker over any store and price source.
    pub fn new(
        store: Arc<dyn InvestmentStore>,
        source: Arc<dyn PriceSource>,
        settings: Settings,
    ) -> Self {
        let fetcher = Arc::new(PriceFetcher::new(source, settings.request_timeout()));
        let investment_service = InvestmentService::new(store.clone(), fetcher.clone());
        let valuation_service = ValuationService::new(store, fetcher.clone());

        Self {
            settings,
            fetcher,
            investment_service,
            valuation_service,
        }
    }

    /// Build a tracker priced by the public Coinbase API.
    pub fn with_coinbase(store: Arc<dyn InvestmentStore>, settings: Settings) -> Self {
        let source = Arc::new(CoinbaseProvider::new(&settings));
        Self::new(store, source, settings)
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Registration ────────────────────────────────────────────────

    /// Create an empty investment record for a newly registered user.
    pub async fn register_user(&self, user_id: &str) -> Result<InvestmentRecord, CoreError> {
        self.investment_service.register_user(user_id).await
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Current value of all priced holdings.
    pub async fn current_price_totals(&self, user_id: &str) -> Result<Decimal, CoreError> {
        self.valuation_service.current_price_totals(user_id).await
    }

    /// Per-asset breakdown behind `current_price_totals`.
    pub async fn valuate(&self, user_id: &str) -> Result<ValuationResult, CoreError> {
        self.valuation_service.valuate(user_id).await
    }

    /// Spot prices for held assets, optionally narrowed to `asset_filter`.
    pub async fn get_current_prices(
        &self,
        user_id: &str,
        asset_filter: Option<&[String]>,
    ) -> Result<PriceMap, CoreError> {
        self.valuation_service
            .get_current_prices(user_id, asset_filter)
            .await
    }

    /// Live value compared against the recorded initial investment.
    pub async fn profit_summary(&self, user_id: &str) -> Result<ProfitSummary, CoreError> {
        self.valuation_service.profit_summary(user_id).await
    }

    /// Spot prices for arbitrary assets, independent of any user.
    pub async fn quote_assets(&self, asset_ids: &[String]) -> Result<PriceMap, CoreError> {
        self.fetcher.fetch_prices(asset_ids).await
    }

    // ── Investments ─────────────────────────────────────────────────

    pub async fn get_user_init_investment(&self, user_id: &str) -> Result<Decimal, CoreError> {
        self.investment_service.get_user_init_investment(user_id).await
    }

    pub async fn get_all_investments(&self, user_id: &str) -> Result<Vec<Holding>, CoreError> {
        self.investment_service.get_all_investments(user_id).await
    }

    /// Merge `holdings` into the user's current holdings and re-baseline.
    pub async fn update_init_investment(
        &self,
        user_id: &str,
        holdings: Vec<Holding>,
    ) -> Result<Decimal, CoreError> {
        self.investment_service
            .update_init_investment(user_id, holdings)
            .await
    }

    /// Replace the user's holdings with `holdings` and re-baseline.
    pub async fn reset_init_investment(
        &self,
        user_id: &str,
        holdings: Vec<Holding>,
    ) -> Result<Decimal, CoreError> {
        self.investment_service
            .reset_init_investment(user_id, holdings)
            .await
    }

    pub async fn save_total_profit(
        &self,
        user_id: &str,
        total_profit: Decimal,
    ) -> Result<Decimal, CoreError> {
        self.investment_service
            .save_total_profit(user_id, total_profit)
            .await
    }
}
