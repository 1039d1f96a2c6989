use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::traits::InvestmentStore;
use crate::errors::CoreError;
use crate::models::investment::InvestmentRecord;

/// Process-local store. Records are cloned in and out, so callers only ever
/// hold snapshots.
#[derive(Debug, Default)]
pub struct InMemoryInvestmentStore {
    records: RwLock<HashMap<String, InvestmentRecord>>,
}

impl InMemoryInvestmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records.
    pub fn with_records(records: impl IntoIterator<Item = InvestmentRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|r| (r.user_id.clone(), r))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave a half-written record:
    // writes are a single `insert` of a complete value.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, InvestmentRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, InvestmentRecord>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl InvestmentStore for InMemoryInvestmentStore {
    async fn get(&self, user_id: &str) -> Result<Option<InvestmentRecord>, CoreError> {
        Ok(self.read().get(user_id).cloned())
    }

    async fn put(&self, record: InvestmentRecord) -> Result<(), CoreError> {
        self.write().insert(record.user_id.clone(), record);
        Ok(())
    }
}
