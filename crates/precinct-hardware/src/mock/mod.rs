//! Mock scanner implementations for testing and development.
//!
//! All mocks share one simulated device with simple paper physics: a scan
//! moves the sheet from the front to the back, ejecting forward drops it into
//! the ballot box, retracting pushes it back out the front. A
//! [`MockScannerHandle`] scripts the device from the outside.

pub mod connector;
pub mod device;
pub mod push;
pub mod scanner;

pub use connector::MockConnector;
pub use device::{MockScannerHandle, ScanOutcome};
pub use push::MockPushScanner;
pub use scanner::MockScanner;
