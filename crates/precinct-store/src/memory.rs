//! In-memory sheet store for tests and demos.

use crate::error::{StorageError, StorageResult};
use crate::store::SheetStore;
use precinct_core::{BatchId, ElectionConfig, ScannerSettings, SheetId, SheetPages};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A sheet as held by [`MemorySheetStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSheet {
    pub batch_id: BatchId,
    pub pages: SheetPages,
    pub adjudicated: bool,
    pub deleted: bool,
}

#[derive(Debug, Default)]
struct Inner {
    ongoing_batch: Option<BatchId>,
    sheets: HashMap<SheetId, StoredSheet>,
    add_calls: Vec<SheetId>,
    election_config: Option<ElectionConfig>,
    settings: ScannerSettings,
}

impl Inner {
    fn insert(
        &mut self,
        sheet_id: SheetId,
        batch_id: BatchId,
        pages: &SheetPages,
        deleted: bool,
    ) -> StorageResult<()> {
        self.add_calls.push(sheet_id);

        if self.sheets.contains_key(&sheet_id) {
            return Err(StorageError::Conflict(format!("sheet {sheet_id} already recorded")));
        }

        self.sheets.insert(
            sheet_id,
            StoredSheet {
                batch_id,
                pages: pages.clone(),
                adjudicated: false,
                deleted,
            },
        );
        debug!("Stored sheet {} in batch {}", sheet_id, batch_id);
        Ok(())
    }
}

/// Sheet store kept entirely in memory.
///
/// Cloning yields another handle to the same data, so tests can inspect what
/// the controller recorded.
///
/// # Examples
///
/// ```
/// use precinct_store::{MemorySheetStore, SheetStore};
///
/// # async fn example() -> precinct_store::StorageResult<()> {
/// let store = MemorySheetStore::new();
/// assert_eq!(store.ballots_counted().await?, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySheetStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-configured for an election.
    pub fn with_election(config: ElectionConfig) -> Self {
        let inner = Inner {
            election_config: Some(config),
            ..Inner::default()
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub async fn set_election_config(&self, config: Option<ElectionConfig>) {
        self.inner.lock().await.election_config = config;
    }

    pub async fn set_scanner_settings(&self, settings: ScannerSettings) {
        self.inner.lock().await.settings = settings;
    }

    /// Every sheet id written, accepted or rejected, in call order, including
    /// writes that failed.
    pub async fn add_calls(&self) -> Vec<SheetId> {
        self.inner.lock().await.add_calls.clone()
    }

    pub async fn sheet(&self, sheet_id: SheetId) -> Option<StoredSheet> {
        self.inner.lock().await.sheets.get(&sheet_id).cloned()
    }

    /// Close the open batch; the next sheet opens a new one.
    pub async fn end_batch(&self) {
        self.inner.lock().await.ongoing_batch = None;
    }
}

impl SheetStore for MemorySheetStore {
    async fn ongoing_batch_id(&self) -> StorageResult<BatchId> {
        let mut inner = self.inner.lock().await;
        Ok(*inner.ongoing_batch.get_or_insert_with(BatchId::new))
    }

    async fn add_sheet(
        &self,
        sheet_id: SheetId,
        batch_id: BatchId,
        pages: &SheetPages,
    ) -> StorageResult<()> {
        self.inner.lock().await.insert(sheet_id, batch_id, pages, false)
    }

    async fn record_rejected_sheet(
        &self,
        sheet_id: SheetId,
        batch_id: BatchId,
        pages: &SheetPages,
    ) -> StorageResult<()> {
        self.inner.lock().await.insert(sheet_id, batch_id, pages, true)
    }

    async fn delete_sheet(&self, sheet_id: SheetId) -> StorageResult<()> {
        let mut inner = self.inner.lock().await;
        let sheet = inner
            .sheets
            .get_mut(&sheet_id)
            .ok_or_else(|| StorageError::sheet_not_found(sheet_id))?;
        sheet.deleted = true;
        Ok(())
    }

    async fn adjudicate_sheet(&self, sheet_id: SheetId) -> StorageResult<()> {
        let mut inner = self.inner.lock().await;
        let sheet = inner
            .sheets
            .get_mut(&sheet_id)
            .ok_or_else(|| StorageError::sheet_not_found(sheet_id))?;
        sheet.adjudicated = true;
        Ok(())
    }

    async fn ballots_counted(&self) -> StorageResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.sheets.values().filter(|s| !s.deleted).count() as u64)
    }

    async fn election_config(&self) -> StorageResult<Option<ElectionConfig>> {
        Ok(self.inner.lock().await.election_config.clone())
    }

    async fn scanner_settings(&self) -> StorageResult<ScannerSettings> {
        Ok(self.inner.lock().await.settings)
    }
}
