use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::upstream::CoinDeskClient;

/// One known asset: ticker symbol plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub symbol: String,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl AssetRecord {
    pub fn new(symbol: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            display_name: display_name.into(),
        }
    }
}

/// Locally cached directory of all known assets.
///
/// The snapshot is immutable once published and replaced wholesale on each
/// refresh; the lock only guards the pointer swap, so readers in flight keep
/// the snapshot they already hold and never observe a partial rebuild.
#[derive(Debug)]
pub struct AssetDirectory {
    snapshot: RwLock<Arc<[AssetRecord]>>,
}

impl AssetDirectory {
    /// Create an empty directory; it stays empty until the first
    /// successful refresh.
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Vec::new().into()),
        }
    }

    /// Latest published snapshot. O(1), never blocks on a refresh in
    /// progress, never fails.
    pub fn current(&self) -> Arc<[AssetRecord]> {
        self.snapshot
            .read()
            .expect("directory snapshot lock should not be poisoned")
            .clone()
    }

    /// Atomically replace the current snapshot.
    pub fn publish(&self, records: Vec<AssetRecord>) {
        let mut slot = self
            .snapshot
            .write()
            .expect("directory snapshot lock should not be poisoned");
        *slot = records.into();
    }

    /// Rebuild the directory from the upstream summary list.
    ///
    /// On failure the previous snapshot remains authoritative and the error
    /// is returned to the scheduler for logging; in-flight lookups are
    /// unaffected either way. Returns the published record count.
    pub async fn refresh(&self, client: &CoinDeskClient) -> Result<usize, UpstreamError> {
        let summary = client.summary_list().await?;

        let records: Vec<AssetRecord> = summary
            .data
            .list
            .into_iter()
            .map(|entry| AssetRecord::new(entry.symbol, entry.name))
            .collect();
        let count = records.len();

        self.publish(records);
        Ok(count)
    }
}

impl Default for AssetDirectory {
    fn default() -> Self {
        Self::new()
    }
}
