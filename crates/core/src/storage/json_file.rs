use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::traits::InvestmentStore;
use crate::errors::CoreError;
use crate::models::investment::InvestmentRecord;

/// Current store file format version.
pub const CURRENT_VERSION: u16 = 1;

/// On-disk layout of the store file.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreFile {
    pub version: u16,
    pub records: Vec<InvestmentRecord>,
}

/// Store persisted as a single JSON file.
///
/// Every `put` rewrites the whole file: serialize → write `<path>.tmp` →
/// rename over `<path>`. The in-memory copy is only replaced once the
/// rename succeeded, so a failed write leaves both disk and memory on the
/// previous state.
///
/// Writers queue on `write_lock`; readers only take the map's read lock,
/// which is never held across file IO.
pub struct JsonFileStore {
    path: PathBuf,
    records: RwLock<HashMap<String, InvestmentRecord>>,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; it is
    /// created on the first `put`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => decode(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), records = records.len(), "Opened JSON investment store");
        Ok(Self {
            path,
            records: RwLock::new(records),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &HashMap<String, InvestmentRecord>) -> Result<(), CoreError> {
        let bytes = encode(records)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Serialize records sorted by user id, so the file diffs cleanly.
pub fn encode(records: &HashMap<String, InvestmentRecord>) -> Result<Vec<u8>, CoreError> {
    let mut sorted: Vec<InvestmentRecord> = records.values().cloned().collect();
    sorted.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    let file = StoreFile {
        version: CURRENT_VERSION,
        records: sorted,
    };
    serde_json::to_vec_pretty(&file)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize store: {e}")))
}

pub fn decode(bytes: &[u8]) -> Result<HashMap<String, InvestmentRecord>, CoreError> {
    let file: StoreFile = serde_json::from_slice(bytes)
        .map_err(|e| CoreError::Deserialization(format!("Failed to parse store file: {e}")))?;
    if file.version != CURRENT_VERSION {
        return Err(CoreError::Deserialization(format!(
            "Unsupported store file version: {}",
            file.version
        )));
    }
    Ok(file
        .records
        .into_iter()
        .map(|r| (r.user_id.clone(), r))
        .collect())
}

#[async_trait]
impl InvestmentStore for JsonFileStore {
    async fn get(&self, user_id: &str) -> Result<Option<InvestmentRecord>, CoreError> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn put(&self, record: InvestmentRecord) -> Result<(), CoreError> {
        let _writer = self.write_lock.lock().await;
        let mut next = self.records.read().await.clone();
        next.insert(record.user_id.clone(), record);

        self.persist(&next)
            .await
            .map_err(|e| CoreError::StoreFailure(format!("{}: {e}", self.path.display())))?;

        *self.records.write().await = next;
        Ok(())
    }
}
