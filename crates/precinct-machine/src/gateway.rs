//! Seams to the application: ballot interpretation and scan readiness.

use crate::context::ScannedSheet;
use crate::error::InterpretError;
use precinct_core::{ElectionConfig, Interpretation};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Interprets a scanned sheet against an election.
///
/// Must be deterministic for a given sheet and configuration, and must
/// return an interpretation carrying the sheet's own id.
pub trait Interpreter: Send + Sync + 'static {
    fn interpret(
        &self,
        sheet: &ScannedSheet,
        config: &ElectionConfig,
    ) -> impl Future<Output = Result<Interpretation, InterpretError>> + Send;
}

/// Whether the application wants sheets scanned as soon as they arrive.
pub trait ScanGate: Send + Sync + 'static {
    fn is_ready_to_scan(&self) -> impl Future<Output = bool> + Send;
}

/// Scan every inserted sheet automatically.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoScan;

impl ScanGate for AutoScan {
    async fn is_ready_to_scan(&self) -> bool {
        true
    }
}

/// Never scan automatically; wait for an explicit scan command.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualScan;

impl ScanGate for ManualScan {
    async fn is_ready_to_scan(&self) -> bool {
        false
    }
}

/// Readiness switched by the application, e.g. when polls open or close.
#[derive(Debug, Clone, Default)]
pub struct ScanSwitch(Arc<AtomicBool>);

impl ScanSwitch {
    pub fn new(ready: bool) -> Self {
        Self(Arc::new(AtomicBool::new(ready)))
    }

    pub fn set_ready(&self, ready: bool) {
        self.0.store(ready, Ordering::SeqCst);
    }
}

impl ScanGate for ScanSwitch {
    async fn is_ready_to_scan(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
