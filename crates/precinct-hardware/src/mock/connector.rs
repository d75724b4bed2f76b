//! Mock connector handing out clients for one simulated device.

use crate::devices::AnyScannerClient;
use crate::mock::device::{MockDevice, MockScannerHandle};
use crate::mock::{MockPushScanner, MockScanner};
use crate::traits::ScannerConnector;
use crate::types::StatusMode;
use crate::Result;
use tracing::debug;

/// Connector for a simulated scanner.
///
/// Every successful [`connect`](ScannerConnector::connect) returns a new
/// client attached to the same device, so scripted paper survives
/// reconnects.
///
/// # Examples
///
/// ```
/// use precinct_hardware::mock::MockConnector;
/// use precinct_hardware::traits::{ScannerClient, ScannerConnector};
///
/// #[tokio::main]
/// async fn main() -> precinct_hardware::Result<()> {
///     let (connector, handle) = MockConnector::polling();
///
///     handle.insert_sheet();
///     let mut client = connector.connect().await?;
///     assert!(client.get_status().await?.all_front());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockConnector {
    device: MockDevice,
    mode: StatusMode,
}

impl MockConnector {
    /// Connector for a device that speaks the given status mode.
    pub fn new(mode: StatusMode) -> (Self, MockScannerHandle) {
        let device = MockDevice::new();
        let handle = MockScannerHandle::new(device.clone());
        (Self { device, mode }, handle)
    }

    pub fn polling() -> (Self, MockScannerHandle) {
        Self::new(StatusMode::Polling)
    }

    pub fn push() -> (Self, MockScannerHandle) {
        Self::new(StatusMode::Push)
    }
}

impl ScannerConnector for MockConnector {
    async fn connect(&self) -> Result<AnyScannerClient> {
        self.device.open()?;
        debug!("Mock scanner connected ({:?})", self.mode);

        Ok(match self.mode {
            StatusMode::Polling => {
                AnyScannerClient::MockPolling(MockScanner::attach(self.device.clone()))
            }
            StatusMode::Push => {
                AnyScannerClient::MockPush(MockPushScanner::attach(self.device.clone()))
            }
        })
    }

    fn supports_ultrasonic(&self) -> bool {
        self.mode == StatusMode::Push
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::traits::ScannerClient;
    use crate::HardwareError;

    #[tokio::test]
    async fn test_connect_while_offline_fails() {
        let (connector, handle) = MockConnector::polling();
        handle.go_offline();

        let error = connector.connect().await.unwrap_err();
        assert_eq!(error.code(), Some(ErrorCode::ScannerOffline));
        assert!(!handle.is_connected());
    }

    #[tokio::test]
    async fn test_queued_connect_failure() {
        let (connector, handle) = MockConnector::polling();
        handle.queue_connect_failure(HardwareError::initialization_failed("bad firmware"));

        assert!(connector.connect().await.is_err());
        assert!(connector.connect().await.is_ok());
        assert_eq!(handle.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_mode_selects_variant() {
        let (polling, _) = MockConnector::polling();
        let (push, _) = MockConnector::push();

        let client = polling.connect().await.unwrap();
        assert!(matches!(client, AnyScannerClient::MockPolling(_)));
        assert!(!polling.supports_ultrasonic());

        let client = push.connect().await.unwrap();
        assert!(matches!(client, AnyScannerClient::MockPush(_)));
        assert!(push.supports_ultrasonic());
        assert_eq!(client.status_mode(), StatusMode::Push);
    }
}
