pub mod investment_service;
pub mod price_fetcher;
pub mod user_locks;
pub mod valuation_service;

use crate::errors::CoreError;
use crate::models::investment::InvestmentRecord;
use crate::storage::traits::InvestmentStore;

/// Reject blank user ids before they reach the store.
pub(crate) fn validate_user_id(user_id: &str) -> Result<(), CoreError> {
    if user_id.trim().is_empty() {
        return Err(CoreError::ValidationError(
            "User id must not be empty".into(),
        ));
    }
    Ok(())
}

/// Load a user's record, failing with `NotFound` instead of defaulting.
pub(crate) async fn load_record(
    store: &dyn InvestmentStore,
    user_id: &str,
) -> Result<InvestmentRecord, CoreError> {
    validate_user_id(user_id)?;
    store
        .get(user_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(user_id.to_string()))
}

/// Write a full record, reporting any failure as `StoreFailure`.
pub(crate) async fn store_record(
    store: &dyn InvestmentStore,
    record: InvestmentRecord,
) -> Result<(), CoreError> {
    store.put(record).await.map_err(|e| match e {
        CoreError::StoreFailure(_) => e,
        other => CoreError::StoreFailure(other.to_string()),
    })
}
