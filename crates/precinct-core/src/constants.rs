//! Timing and retry constants for the precinct scanner controller.
//!
//! Every delay the controller waits on is defined here in milliseconds. The
//! machine converts them into [`std::time::Duration`] values through its
//! `Delays` configuration, so tests can shrink or override any of them.
//!
//! # Groups
//!
//! | Group | Constants |
//! |-------|-----------|
//! | Status polling | `DELAY_PAPER_STATUS_POLLING_*` |
//! | Scan pipeline | `DELAY_SCANNING_TIMEOUT`, `DELAY_JAM_WHEN_SCANNING` |
//! | Disposition | `DELAY_ACCEPT*`, `DELAY_WAIT_FOR_HOLD_AFTER_REJECT` |
//! | Recovery | `DELAY_RECONNECT*`, `DELAY_WAIT_FOR_JAM_CLEARED` |
//! | Calibration | `DELAY_*_CALIBRATION_TIMEOUT` |
//!
//! # Usage
//!
//! ```
//! use precinct_core::constants::*;
//! use std::time::Duration;
//!
//! let poll = Duration::from_millis(DELAY_PAPER_STATUS_POLLING_INTERVAL);
//! assert!(poll < Duration::from_millis(DELAY_PAPER_STATUS_POLLING_TIMEOUT));
//! ```

// ============================================================================
// Status Polling
// ============================================================================

/// Interval between status queries for a polling scanner client.
pub const DELAY_PAPER_STATUS_POLLING_INTERVAL: u64 = 500;

/// Faster polling interval used while waiting for an accepted sheet to leave.
///
/// A second sheet inserted while the first is still moving must be noticed
/// before the motor pulls it in.
pub const DELAY_PAPER_STATUS_POLLING_INTERVAL_DURING_ACCEPT: u64 = 250;

/// Hard limit for a single status query. Exceeding it is a fatal poll error.
pub const DELAY_PAPER_STATUS_POLLING_TIMEOUT: u64 = 2_000;

// ============================================================================
// Scan Pipeline
// ============================================================================

/// Upper bound for a scan command to complete.
pub const DELAY_SCANNING_TIMEOUT: u64 = 5_000;

/// Settle time after a jam during scanning before the jam kind is read.
///
/// The double-sheet flag is only reliable once the transport has stopped.
pub const DELAY_JAM_WHEN_SCANNING: u64 = 500;

/// Interval between application readiness checks while paper waits at the front.
pub const DELAY_APP_READY_TO_SCAN_POLLING_INTERVAL: u64 = 500;

// ============================================================================
// Disposition
// ============================================================================

/// Time allowed for an accepted sheet to leave the transport.
pub const DELAY_ACCEPTING_TIMEOUT: u64 = 5_000;

/// How long the accepted screen holds before paper status is checked again.
pub const DELAY_ACCEPTED_READY_FOR_NEXT_BALLOT: u64 = 2_000;

/// Time allowed for a rejected sheet to be held at the front.
pub const DELAY_WAIT_FOR_HOLD_AFTER_REJECT: u64 = 2_000;

// ============================================================================
// Recovery
// ============================================================================

/// Wait between reconnect attempts after a plain disconnect.
pub const DELAY_RECONNECT: u64 = 500;

/// Wait used at each step of the generic error-recovery sequence.
pub const DELAY_RECONNECT_ON_UNEXPECTED_ERROR: u64 = 3_000;

/// Time allowed for a software-detected jam to clear after retracting paper.
pub const DELAY_WAIT_FOR_JAM_CLEARED: u64 = 500;

// ============================================================================
// Calibration
// ============================================================================

/// Time allowed for each double-feed calibration step.
///
/// Includes the time the operator needs to feed the calibration sheets.
pub const DELAY_DOUBLE_FEED_CALIBRATION_TIMEOUT: u64 = 60_000;

/// Time allowed for image sensor calibration against a blank sheet.
pub const DELAY_IMAGE_SENSOR_CALIBRATION_TIMEOUT: u64 = 60_000;

// ============================================================================
// Limits
// ============================================================================

/// Number of interpretation failures tolerated before a sheet is rejected.
///
/// A sheet whose interpretation always fails is scanned exactly
/// `MAX_FAILED_SCAN_ATTEMPTS + 1` times.
pub const MAX_FAILED_SCAN_ATTEMPTS: u32 = 1;

/// Maximum number of state transitions retained for audit.
pub const MAX_HISTORY_SIZE: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polling_interval_shorter_than_timeout() {
        assert!(DELAY_PAPER_STATUS_POLLING_INTERVAL < DELAY_PAPER_STATUS_POLLING_TIMEOUT);
        assert!(
            DELAY_PAPER_STATUS_POLLING_INTERVAL_DURING_ACCEPT < DELAY_PAPER_STATUS_POLLING_INTERVAL
        );
    }

    #[test]
    fn test_recovery_delays_ordered() {
        assert!(DELAY_RECONNECT < DELAY_RECONNECT_ON_UNEXPECTED_ERROR);
    }
}
