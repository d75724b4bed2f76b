//! Paper status watcher.
//!
//! Turns a scanner's status surface into a stream of readings, hiding the
//! difference between polling and push clients:
//!
//! ```text
//! ┌──────────────┐  get_status every interval   ┌──────────────┐
//! │ Polling      │ ───────────────────────────► │              │
//! │ client       │  (timeout per call)          │  on_reading  │──► consumer
//! └──────────────┘                              │  callback    │
//! ┌──────────────┐  snapshot, then each change  │              │
//! │ Push client  │ ───────────────────────────► │              │
//! └──────────────┘                              └──────────────┘
//! ```
//!
//! The watcher runs until the callback asks it to stop. Dropping or aborting
//! the future releases the client lock.

use crate::devices::SharedScannerClient;
use crate::traits::ScannerClient;
use crate::types::{RawStatus, StatusMode};
use crate::{HardwareError, Result};
use precinct_core::constants::{
    DELAY_PAPER_STATUS_POLLING_INTERVAL, DELAY_PAPER_STATUS_POLLING_TIMEOUT,
};
use std::time::Duration;
use tracing::trace;

/// Polling cadence for a status watcher.
///
/// Push clients ignore both values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    /// Pause between two status queries.
    pub interval: Duration,
    /// Limit for a single status query.
    pub timeout: Duration,
}

impl WatchConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Set the polling interval.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DELAY_PAPER_STATUS_POLLING_INTERVAL),
            timeout: Duration::from_millis(DELAY_PAPER_STATUS_POLLING_TIMEOUT),
        }
    }
}

/// Watch the scanner's paper status until `on_reading` returns `false`.
///
/// A polling query that exceeds `config.timeout` is reported as
/// [`HardwareError::Timeout`]. Errors are passed to the callback like any
/// other reading; the callback decides whether watching continues.
///
/// # Examples
///
/// ```
/// use precinct_hardware::devices::AnyScannerClient;
/// use precinct_hardware::mock::MockScanner;
/// use precinct_hardware::watcher::{watch_status, WatchConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let (scanner, handle) = MockScanner::new();
///     handle.insert_sheet();
///     let client = AnyScannerClient::MockPolling(scanner).into_shared();
///
///     let mut readings = Vec::new();
///     watch_status(client, WatchConfig::default(), |reading| {
///         readings.push(reading);
///         false
///     })
///     .await;
///
///     assert!(readings[0].as_ref().unwrap().all_front());
/// }
/// ```
pub async fn watch_status<F>(client: SharedScannerClient, config: WatchConfig, mut on_reading: F)
where
    F: FnMut(Result<RawStatus>) -> bool,
{
    let mode = client.lock().await.status_mode();
    let mut first = true;

    loop {
        let reading = {
            let mut guard = client.lock().await;
            match mode {
                StatusMode::Polling => {
                    match tokio::time::timeout(config.timeout, guard.get_status()).await {
                        Ok(result) => result,
                        Err(_) => Err(HardwareError::timeout(config.timeout.as_millis() as u64)),
                    }
                }
                StatusMode::Push if first => guard.get_status().await,
                StatusMode::Push => guard.wait_for_status_change().await,
            }
        };
        first = false;
        trace!("Paper status reading: {:?}", reading);

        if !on_reading(reading) {
            break;
        }

        if mode == StatusMode::Polling {
            tokio::time::sleep(config.interval).await;
        }
    }
}
