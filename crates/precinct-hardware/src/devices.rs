//! Enum wrapper for scanner client dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn ScannerClient>`
//! is unavailable. [`AnyScannerClient`] provides concrete dispatch instead and
//! is what connectors hand out and what the controller shares between tasks.
//!
//! # Examples
//!
//! ```
//! use precinct_hardware::devices::AnyScannerClient;
//! use precinct_hardware::mock::MockScanner;
//! use precinct_hardware::traits::ScannerClient;
//! use precinct_hardware::types::StatusMode;
//!
//! let (scanner, _handle) = MockScanner::new();
//! let client = AnyScannerClient::MockPolling(scanner);
//! assert_eq!(client.status_mode(), StatusMode::Polling);
//! ```

use crate::mock::{MockPushScanner, MockScanner};
use crate::traits::ScannerClient;
use crate::types::{
    DeviceInfo, DoubleFeedCalibration, EjectMotion, FormMovement, RawStatus, ScanOptions,
    SheetImages, StatusMode,
};
use crate::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A client shared between the status watcher and command executors.
///
/// The mutex serializes every call to the device.
pub type SharedScannerClient = Arc<Mutex<AnyScannerClient>>;

/// Enum wrapper for scanner client dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyScannerClient {
    /// Simulated scanner that is polled for status.
    MockPolling(MockScanner),
    /// Simulated scanner that pushes status changes.
    MockPush(MockPushScanner),
}

impl AnyScannerClient {
    /// Wrap the client for sharing across tasks.
    pub fn into_shared(self) -> SharedScannerClient {
        Arc::new(Mutex::new(self))
    }
}

impl ScannerClient for AnyScannerClient {
    fn status_mode(&self) -> StatusMode {
        match self {
            Self::MockPolling(device) => device.status_mode(),
            Self::MockPush(device) => device.status_mode(),
        }
    }

    async fn get_status(&mut self) -> Result<RawStatus> {
        match self {
            Self::MockPolling(device) => device.get_status().await,
            Self::MockPush(device) => device.get_status().await,
        }
    }

    async fn wait_for_status_change(&mut self) -> Result<RawStatus> {
        match self {
            Self::MockPolling(device) => device.wait_for_status_change().await,
            Self::MockPush(device) => device.wait_for_status_change().await,
        }
    }

    async fn scan(&mut self, options: &ScanOptions) -> Result<SheetImages> {
        match self {
            Self::MockPolling(device) => device.scan(options).await,
            Self::MockPush(device) => device.scan(options).await,
        }
    }

    async fn move_paper(&mut self, movement: FormMovement) -> Result<()> {
        match self {
            Self::MockPolling(device) => device.move_paper(movement).await,
            Self::MockPush(device) => device.move_paper(movement).await,
        }
    }

    async fn eject_document(&mut self, motion: EjectMotion) -> Result<()> {
        match self {
            Self::MockPolling(device) => device.eject_document(motion).await,
            Self::MockPush(device) => device.eject_document(motion).await,
        }
    }

    async fn reset_hardware(&mut self) -> Result<()> {
        match self {
            Self::MockPolling(device) => device.reset_hardware().await,
            Self::MockPush(device) => device.reset_hardware().await,
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        match self {
            Self::MockPolling(device) => device.disconnect().await,
            Self::MockPush(device) => device.disconnect().await,
        }
    }

    async fn calibrate_double_feed_detection(&mut self, kind: DoubleFeedCalibration) -> Result<()> {
        match self {
            Self::MockPolling(device) => device.calibrate_double_feed_detection(kind).await,
            Self::MockPush(device) => device.calibrate_double_feed_detection(kind).await,
        }
    }

    async fn calibrate_image_sensors(&mut self) -> Result<()> {
        match self {
            Self::MockPolling(device) => device.calibrate_image_sensors().await,
            Self::MockPush(device) => device.calibrate_image_sensors().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::MockPolling(device) => device.get_info().await,
            Self::MockPush(device) => device.get_info().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPushScanner;

    #[tokio::test]
    async fn test_dispatch_polling() {
        let (scanner, handle) = MockScanner::new();
        let mut client = AnyScannerClient::MockPolling(scanner);

        handle.insert_sheet();
        let status = client.get_status().await.unwrap();
        assert!(status.all_front());

        let info = client.get_info().await.unwrap();
        assert_eq!(info.name, "Mock Scanner");
    }

    #[tokio::test]
    async fn test_dispatch_push() {
        let (scanner, _handle) = MockPushScanner::new();
        let client = AnyScannerClient::MockPush(scanner);
        assert_eq!(client.status_mode(), StatusMode::Push);
    }

    #[tokio::test]
    async fn test_shared_client_serializes_calls() {
        let (scanner, handle) = MockScanner::new();
        let shared = AnyScannerClient::MockPolling(scanner).into_shared();

        handle.insert_sheet();
        let images = shared.lock().await.scan(&ScanOptions::default()).await.unwrap();
        assert_eq!(images.front.width, images.back.width);
        assert!(shared.lock().await.get_status().await.unwrap().any_back());
    }
}
