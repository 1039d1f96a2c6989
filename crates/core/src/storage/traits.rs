use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::investment::InvestmentRecord;

/// Durable mapping from user id to that user's [`InvestmentRecord`].
///
/// Implementations must make a record visible atomically: a `get` racing a
/// `put` sees either the whole old record or the whole new one.
#[async_trait]
pub trait InvestmentStore: Send + Sync {
    /// Snapshot of the user's record, or `None` if the user is unknown.
    async fn get(&self, user_id: &str) -> Result<Option<InvestmentRecord>, CoreError>;

    /// Insert or replace the record keyed by `record.user_id`.
    /// Returns `CoreError::StoreFailure` if the write did not commit.
    async fn put(&self, record: InvestmentRecord) -> Result<(), CoreError>;
}
