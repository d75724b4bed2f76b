use crate::error::StorageResult;
use precinct_core::{BatchId, ElectionConfig, ScannerSettings, SheetId, SheetPages};
use std::future::Future;

/// Durable record of scanned sheets and the settings the scanner runs under.
///
/// Returned futures are `Send` so the scanner controller can await them on
/// its spawned driver task.
///
/// # Recording protocol
///
/// - Accepted sheet: [`add_sheet`](Self::add_sheet), plus
///   [`adjudicate_sheet`](Self::adjudicate_sheet) if a poll worker accepted it
///   after review.
/// - Rejected sheet: [`record_rejected_sheet`](Self::record_rejected_sheet),
///   which stores and soft-deletes the sheet in one write. The row stays for
///   audit and is never included in [`ballots_counted`](Self::ballots_counted).
pub trait SheetStore: Send + Sync + 'static {
    /// Id of the open batch, opening a new one if none is open.
    fn ongoing_batch_id(&self) -> impl Future<Output = StorageResult<BatchId>> + Send;

    /// Record a scanned sheet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`](crate::StorageError::Conflict) if the
    /// sheet id was already recorded.
    fn add_sheet(
        &self,
        sheet_id: SheetId,
        batch_id: BatchId,
        pages: &SheetPages,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    /// Record a sheet that was rejected, returned or jammed.
    ///
    /// The insert and the soft-delete commit together: a crash between them
    /// must not leave a live row that would be counted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`](crate::StorageError::Conflict) if the
    /// sheet id was already recorded. Nothing is written in that case.
    fn record_rejected_sheet(
        &self,
        sheet_id: SheetId,
        batch_id: BatchId,
        pages: &SheetPages,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    /// Exclude a recorded sheet from tabulation.
    fn delete_sheet(&self, sheet_id: SheetId) -> impl Future<Output = StorageResult<()>> + Send;

    /// Mark a recorded sheet as accepted after review.
    fn adjudicate_sheet(&self, sheet_id: SheetId)
    -> impl Future<Output = StorageResult<()>> + Send;

    /// Number of sheets counted: not deleted, in a batch that is not deleted.
    fn ballots_counted(&self) -> impl Future<Output = StorageResult<u64>> + Send;

    /// Current election configuration, if the scanner is configured.
    fn election_config(&self) -> impl Future<Output = StorageResult<Option<ElectionConfig>>> + Send;

    /// Current operator settings.
    fn scanner_settings(&self) -> impl Future<Output = StorageResult<ScannerSettings>> + Send;
}
