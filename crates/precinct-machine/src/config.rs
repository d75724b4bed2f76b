//! Controller configuration.

use crate::archive::ImageArchive;
use crate::event::Timer;
use precinct_core::constants::*;
use precinct_hardware::WatchConfig;
use std::time::Duration;

/// Every delay the controller waits on.
///
/// Defaults come from [`precinct_core::constants`]. Tests shrink or stretch
/// individual values without touching the transition logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delays {
    pub paper_status_polling_interval: Duration,
    pub paper_status_polling_interval_during_accept: Duration,
    pub paper_status_polling_timeout: Duration,
    pub scanning_timeout: Duration,
    pub jam_when_scanning: Duration,
    pub app_ready_to_scan_polling_interval: Duration,
    pub accepting_timeout: Duration,
    pub accepted_ready_for_next_ballot: Duration,
    pub wait_for_hold_after_reject: Duration,
    pub reconnect: Duration,
    pub reconnect_on_unexpected_error: Duration,
    pub wait_for_jam_cleared: Duration,
    pub double_feed_calibration_timeout: Duration,
    pub image_sensor_calibration_timeout: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            paper_status_polling_interval: Duration::from_millis(
                DELAY_PAPER_STATUS_POLLING_INTERVAL,
            ),
            paper_status_polling_interval_during_accept: Duration::from_millis(
                DELAY_PAPER_STATUS_POLLING_INTERVAL_DURING_ACCEPT,
            ),
            paper_status_polling_timeout: Duration::from_millis(DELAY_PAPER_STATUS_POLLING_TIMEOUT),
            scanning_timeout: Duration::from_millis(DELAY_SCANNING_TIMEOUT),
            jam_when_scanning: Duration::from_millis(DELAY_JAM_WHEN_SCANNING),
            app_ready_to_scan_polling_interval: Duration::from_millis(
                DELAY_APP_READY_TO_SCAN_POLLING_INTERVAL,
            ),
            accepting_timeout: Duration::from_millis(DELAY_ACCEPTING_TIMEOUT),
            accepted_ready_for_next_ballot: Duration::from_millis(
                DELAY_ACCEPTED_READY_FOR_NEXT_BALLOT,
            ),
            wait_for_hold_after_reject: Duration::from_millis(DELAY_WAIT_FOR_HOLD_AFTER_REJECT),
            reconnect: Duration::from_millis(DELAY_RECONNECT),
            reconnect_on_unexpected_error: Duration::from_millis(
                DELAY_RECONNECT_ON_UNEXPECTED_ERROR,
            ),
            wait_for_jam_cleared: Duration::from_millis(DELAY_WAIT_FOR_JAM_CLEARED),
            double_feed_calibration_timeout: Duration::from_millis(
                DELAY_DOUBLE_FEED_CALIBRATION_TIMEOUT,
            ),
            image_sensor_calibration_timeout: Duration::from_millis(
                DELAY_IMAGE_SENSOR_CALIBRATION_TIMEOUT,
            ),
        }
    }
}

impl Delays {
    /// Duration of a state timer.
    #[must_use]
    pub fn timer(&self, timer: Timer) -> Duration {
        match timer {
            Timer::Reconnect => self.reconnect,
            Timer::ScanningTimeout => self.scanning_timeout,
            Timer::JamWhenScanning => self.jam_when_scanning,
            Timer::AppReadyToScan => self.app_ready_to_scan_polling_interval,
            Timer::AcceptingTimeout => self.accepting_timeout,
            Timer::AcceptedReadyForNextBallot => self.accepted_ready_for_next_ballot,
            Timer::WaitForHoldAfterReject => self.wait_for_hold_after_reject,
            Timer::WaitForJamCleared => self.wait_for_jam_cleared,
            Timer::RecoveryStep => self.reconnect_on_unexpected_error,
            Timer::DoubleFeedCalibrationTimeout => self.double_feed_calibration_timeout,
            Timer::ImageSensorCalibrationTimeout => self.image_sensor_calibration_timeout,
        }
    }

    /// Status watcher settings, with the faster interval while accepting.
    #[must_use]
    pub fn watch_config(&self, during_accept: bool) -> WatchConfig {
        let interval = if during_accept {
            self.paper_status_polling_interval_during_accept
        } else {
            self.paper_status_polling_interval
        };
        WatchConfig::new(interval, self.paper_status_polling_timeout)
    }
}

/// Scanner controller configuration.
///
/// # Examples
///
/// ```
/// use precinct_machine::config::MachineConfig;
/// use precinct_machine::archive::ImageArchive;
///
/// let config = MachineConfig::default()
///     .max_failed_scan_attempts(2)
///     .image_archive(ImageArchive::directory("/var/lib/precinct/images"));
///
/// assert_eq!(config.max_failed_scan_attempts, 2);
/// ```
#[derive(Debug, Clone)]
pub struct MachineConfig {
    pub delays: Delays,

    /// Interpretation failures tolerated before a sheet is rejected
    pub max_failed_scan_attempts: u32,

    /// Where scanned images are kept
    pub image_archive: ImageArchive,

    /// Buffered status changes per subscriber
    pub status_channel_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            delays: Delays::default(),
            max_failed_scan_attempts: MAX_FAILED_SCAN_ATTEMPTS,
            image_archive: ImageArchive::Memory,
            status_channel_capacity: 256,
        }
    }
}

impl MachineConfig {
    /// Replace all delays
    pub fn delays(mut self, delays: Delays) -> Self {
        self.delays = delays;
        self
    }

    /// Set the interpretation retry bound
    pub fn max_failed_scan_attempts(mut self, max: u32) -> Self {
        self.max_failed_scan_attempts = max;
        self
    }

    /// Set where images are archived
    pub fn image_archive(mut self, archive: ImageArchive) -> Self {
        self.image_archive = archive;
        self
    }

    /// Set the status subscriber buffer size
    pub fn status_channel_capacity(mut self, capacity: usize) -> Self {
        self.status_channel_capacity = capacity;
        self
    }
}
