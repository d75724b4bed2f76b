//! Event normalizer.
//!
//! Reduces raw sensor snapshots and status-call errors to the small event
//! vocabulary the state machine understands. Rules are applied in priority
//! order, first match wins:
//!
//! | Priority | Condition                         | Event                |
//! |----------|-----------------------------------|----------------------|
//! | 1        | cover open                        | `Disconnected`       |
//! | 2        | jam flag, no paper anywhere       | `JamCleared`         |
//! | 2        | jam flag, double-sheet flag       | `JamDoubleSheet`     |
//! | 2        | jam flag                          | `Jam`                |
//! | 3        | front not fully covered, no back  | `NoPaper`            |
//! | 4        | front fully covered, no back      | `ReadyToScan`        |
//! | 5        | paper at back only                | `ReadyToEject`       |
//! | 6        | paper at front and back           | `BothSidesHavePaper` |
//!
//! A sheet that is only partway in reads as no paper until every front
//! sensor sees it.

use precinct_core::ScannerErrorKind;
use precinct_hardware::{HardwareError, RawStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical paper-path event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerEvent {
    NoPaper,
    ReadyToScan,
    ReadyToEject,
    BothSidesHavePaper,
    Jam,
    JamCleared,
    JamDoubleSheet,
    Disconnected,
}

impl ScannerEvent {
    pub const ALL: [ScannerEvent; 8] = [
        Self::NoPaper,
        Self::ReadyToScan,
        Self::ReadyToEject,
        Self::BothSidesHavePaper,
        Self::Jam,
        Self::JamCleared,
        Self::JamDoubleSheet,
        Self::Disconnected,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoPaper => "no_paper",
            Self::ReadyToScan => "ready_to_scan",
            Self::ReadyToEject => "ready_to_eject",
            Self::BothSidesHavePaper => "both_sides_have_paper",
            Self::Jam => "jam",
            Self::JamCleared => "jam_cleared",
            Self::JamDoubleSheet => "jam_double_sheet",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ScannerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a sensor snapshot to an event. Total over every input.
#[must_use]
pub fn normalize_status(status: &RawStatus) -> ScannerEvent {
    if status.is_cover_open {
        return ScannerEvent::Disconnected;
    }

    let front = status.any_front();
    let back = status.any_back();

    if status.is_jammed() {
        return if !front && !back {
            ScannerEvent::JamCleared
        } else if status.is_double_sheet {
            ScannerEvent::JamDoubleSheet
        } else {
            ScannerEvent::Jam
        };
    }

    match (front, back) {
        (_, false) if !status.all_front() => ScannerEvent::NoPaper,
        (_, false) => ScannerEvent::ReadyToScan,
        (false, true) => ScannerEvent::ReadyToEject,
        (true, true) => ScannerEvent::BothSidesHavePaper,
    }
}

/// Map a failed status call to an event.
///
/// # Errors
///
/// Timeouts and unmapped device errors are faults, not events. They stop
/// the status watcher and surface as the returned [`ScannerErrorKind`].
pub fn normalize_error(error: &HardwareError) -> Result<ScannerEvent, ScannerErrorKind> {
    if error.code().is_some_and(|code| code.is_paper_jam()) {
        return Ok(ScannerEvent::Jam);
    }
    if error.is_connectivity() {
        return Ok(ScannerEvent::Disconnected);
    }
    match error {
        HardwareError::Timeout { .. } => Err(ScannerErrorKind::PaperStatusTimedOut),
        _ => Err(ScannerErrorKind::UnexpectedPaperStatus),
    }
}

/// Normalize one status reading.
///
/// # Errors
///
/// See [`normalize_error`].
pub fn normalize(
    reading: &precinct_hardware::Result<RawStatus>,
) -> Result<ScannerEvent, ScannerErrorKind> {
    match reading {
        Ok(status) => Ok(normalize_status(status)),
        Err(error) => normalize_error(error),
    }
}
