//! Mock push scanner.

use crate::mock::device::{MockDevice, MockScannerHandle};
use crate::traits::ScannerClient;
use crate::types::{
    DeviceInfo, DoubleFeedCalibration, EjectMotion, FormMovement, RawStatus, ScanOptions,
    SheetImages, StatusMode,
};
use crate::{HardwareError, Result};
use tokio::sync::watch;

/// Simulated scanner that pushes a status report on every change.
///
/// Models a scanner with an ultrasonic double-feed sensor.
#[derive(Debug)]
pub struct MockPushScanner {
    device: MockDevice,
    changes: watch::Receiver<u64>,
    name: String,
}

impl MockPushScanner {
    /// Create a connected mock push scanner and its scripting handle.
    pub fn new() -> (Self, MockScannerHandle) {
        let device = MockDevice::new();
        let _ = device.open();
        (Self::attach(device.clone()), MockScannerHandle::new(device))
    }

    pub(crate) fn attach(device: MockDevice) -> Self {
        let changes = device.subscribe();
        Self {
            device,
            changes,
            name: "Mock Push Scanner".to_string(),
        }
    }
}

impl ScannerClient for MockPushScanner {
    fn status_mode(&self) -> StatusMode {
        StatusMode::Push
    }

    async fn get_status(&mut self) -> Result<RawStatus> {
        self.changes.borrow_and_update();
        self.device.status().await
    }

    async fn wait_for_status_change(&mut self) -> Result<RawStatus> {
        self.changes
            .changed()
            .await
            .map_err(|_| HardwareError::disconnected("push status channel closed"))?;
        self.device.status().await
    }

    async fn scan(&mut self, options: &ScanOptions) -> Result<SheetImages> {
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
        self.device.calibrate().await
    }

    async fn calibrate_image_sensors(&mut self) -> Result<()> {
        self.device.calibrate().await
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "MOCK-PUSH").with_firmware_version("1.0.0"))
    }
}
