//! Mock polling scanner.

use crate::mock::device::{MockDevice, MockScannerHandle};
use crate::traits::ScannerClient;
use crate::types::{
    DeviceInfo, DoubleFeedCalibration, EjectMotion, FormMovement, RawStatus, ScanOptions,
    SheetImages, StatusMode,
};
use crate::{HardwareError, Result};
use tracing::debug;

/// Simulated scanner that must be polled for status.
///
/// Models a scanner without an ultrasonic double-feed sensor: double-feed
/// calibration is unsupported.
///
/// # Examples
///
/// ```
/// use precinct_hardware::mock::MockScanner;
/// use precinct_hardware::traits::ScannerClient;
///
/// #[tokio::main]
/// async fn main() -> precinct_hardware::Result<()> {
///     let (mut scanner, handle) = MockScanner::new();
///
///     handle.insert_sheet();
///     assert!(scanner.get_status().await?.all_front());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockScanner {
    device: MockDevice,
    name: String,
}

impl MockScanner {
    /// Create a connected mock scanner and its scripting handle.
    pub fn new() -> (Self, MockScannerHandle) {
        let device = MockDevice::new();
        let scanner = Self::attach(device.clone());
        // A freshly created scanner starts out connected.
        let _ = device.open();
        (scanner, MockScannerHandle::new(device))
    }

    pub(crate) fn attach(device: MockDevice) -> Self {
        Self {
            device,
            name: "Mock Scanner".to_string(),
        }
    }
}

impl ScannerClient for MockScanner {
    fn status_mode(&self) -> StatusMode {
        StatusMode::Polling
    }

    async fn get_status(&mut self) -> Result<RawStatus> {
        self.device.status().await
    }

    async fn wait_for_status_change(&mut self) -> Result<RawStatus> {
        Err(HardwareError::unsupported("wait_for_status_change"))
    }

    async fn scan(&mut self, options: &ScanOptions) -> Result<SheetImages> {
        debug!("{} scanning at {} dpi", self.name, options.resolution_dpi);
        self.device.scan(options).await
    }

    async fn move_paper(&mut self, movement: FormMovement) -> Result<()> {
        self.device.move_paper(movement)
    }

    async fn eject_document(&mut self, motion: EjectMotion) -> Result<()> {
        self.device.move_paper(motion.into())
    }

    async fn reset_hardware(&mut self) -> Result<()> {
        self.device.reset()
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.device.close();
        Ok(())
    }

    async fn calibrate_double_feed_detection(
        &mut self,
        _kind: DoubleFeedCalibration,
    ) -> Result<()> {
        Err(HardwareError::unsupported("calibrate_double_feed_detection"))
    }

    async fn calibrate_image_sensors(&mut self) -> Result<()> {
        self.device.calibrate().await
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "MOCK-POLL").with_firmware_version("1.0.0"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::mock::ScanOutcome;

    #[tokio::test]
    async fn test_scan_moves_sheet_to_back() {
        let (mut scanner, handle) = MockScanner::new();
        handle.insert_sheet();

        scanner.scan(&ScanOptions::default()).await.unwrap();

        let status = handle.status();
        assert!(!status.any_front());
        assert!(status.any_back());
    }

    #[tokio::test]
    async fn test_scan_without_paper_fails() {
        let (mut scanner, _handle) = MockScanner::new();

        let error = scanner.scan(&ScanOptions::default()).await.unwrap_err();
        assert_eq!(error.code(), Some(ErrorCode::NoDocumentToBeScanned));
    }

    #[tokio::test]
    async fn test_scripted_scan_failure_updates_status() {
        let (mut scanner, handle) = MockScanner::new();
        handle.insert_sheet();
        handle.queue_scan_outcome(ScanOutcome::Fail {
            code: ErrorCode::PaperJam,
            status_after: Some(RawStatus::paper_at_back().with_paper_jam()),
        });

        let error = scanner.scan(&ScanOptions::default()).await.unwrap_err();
        assert_eq!(error.code(), Some(ErrorCode::PaperJam));
        assert!(handle.status().is_paper_jam);
    }

    #[tokio::test]
    async fn test_eject_forward_drops_sheet() {
        let (mut scanner, handle) = MockScanner::new();
        handle.set_status(RawStatus::paper_at_back());

        scanner.eject_document(EjectMotion::ToRear).await.unwrap();

        assert_eq!(handle.status(), RawStatus::no_paper());
        assert_eq!(handle.movements(), vec![FormMovement::EjectPaperForward]);
    }

    #[tokio::test]
    async fn test_retract_returns_sheet_to_front() {
        let (mut scanner, handle) = MockScanner::new();
        handle.set_status(RawStatus::paper_at_back());

        scanner.move_paper(FormMovement::RetractPaperBackward).await.unwrap();

        assert_eq!(handle.status(), RawStatus::paper_at_front());
    }

    #[tokio::test]
    async fn test_stalled_eject_keeps_sheet() {
        let (mut scanner, handle) = MockScanner::new();
        handle.set_status(RawStatus::paper_at_back());
        handle.stall_eject(true);

        scanner.move_paper(FormMovement::EjectPaperForward).await.unwrap();

        assert!(handle.status().any_back());
    }

    #[tokio::test]
    async fn test_reset_clears_jam_flags() {
        let (mut scanner, handle) = MockScanner::new();
        handle.jam(true);

        scanner.reset_hardware().await.unwrap();

        let status = handle.status();
        assert!(!status.is_jammed());
        assert!(!status.is_double_sheet);
        assert_eq!(handle.reset_count(), 1);
    }

    #[tokio::test]
    async fn test_offline_status_fails() {
        let (mut scanner, handle) = MockScanner::new();
        handle.go_offline();

        let error = scanner.get_status().await.unwrap_err();
        assert_eq!(error.code(), Some(ErrorCode::ScannerOffline));
    }

    #[tokio::test]
    async fn test_calls_fail_after_disconnect() {
        let (mut scanner, handle) = MockScanner::new();
        scanner.disconnect().await.unwrap();

        assert!(!handle.is_connected());
        assert!(matches!(
            scanner.get_status().await,
            Err(HardwareError::Disconnected { .. })
        ));
    }

    #[tokio::test]
    async fn test_double_feed_calibration_unsupported() {
        let (mut scanner, handle) = MockScanner::new();

        let error = scanner
            .calibrate_double_feed_detection(DoubleFeedCalibration::SingleSheet)
            .await
            .unwrap_err();
        assert!(matches!(error, HardwareError::Unsupported { .. }));

        scanner.calibrate_image_sensors().await.unwrap();
        assert_eq!(handle.calibration_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_calibration_failure() {
        let (mut scanner, handle) = MockScanner::new();
        handle.queue_calibration_failure(HardwareError::timeout(30_000));

        let error = scanner.calibrate_image_sensors().await.unwrap_err();
        assert!(matches!(error, HardwareError::Timeout { duration_ms: 30_000 }));
        scanner.calibrate_image_sensors().await.unwrap();
        assert_eq!(handle.calibration_count(), 2);
    }

    #[tokio::test]
    async fn test_wait_for_status_change_unsupported() {
        let (mut scanner, _handle) = MockScanner::new();
        assert!(scanner.wait_for_status_change().await.is_err());
    }
}
