//! Scanner hardware abstraction layer for the precinct ballot scanner.
//!
//! This crate defines the command surface of a sheet-fed ballot scanner, the
//! raw status it reports, and simulated implementations for development and
//! testing.
//!
//! # Design Philosophy
//!
//! - **Async-first**: device operations use native `async fn` in traits
//!   (Edition 2024 RPITIT).
//! - **Enum dispatch**: native async traits are not object-safe, so
//!   [`AnyScannerClient`] provides concrete dispatch over the client variants.
//! - **Error-aware**: every operation returns [`Result<T>`], and every
//!   [`HardwareError`] classifies itself into a [`FailureClass`].
//!
//! # Client Variants
//!
//! Scanners deliver paper status in one of two ways ([`StatusMode`]): they
//! are polled, or they push a report on every change. The
//! [`watcher`] module hides the difference.
//!
//! ```no_run
//! use precinct_hardware::mock::MockConnector;
//! use precinct_hardware::traits::{ScannerClient, ScannerConnector};
//! use precinct_hardware::types::ScanOptions;
//!
//! #[tokio::main]
//! async fn main() -> precinct_hardware::Result<()> {
//!     let (connector, handle) = MockConnector::polling();
//!     let mut client = connector.connect().await?;
//!
//!     handle.insert_sheet();
//!     let images = client.scan(&ScanOptions::default()).await?;
//!     println!("scanned {}x{}", images.front.width, images.front.height);
//!     Ok(())
//! }
//! ```
//!
//! [`AnyScannerClient`]: devices::AnyScannerClient
//! [`FailureClass`]: error::FailureClass
//! [`StatusMode`]: types::StatusMode

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;
pub mod watcher;

// Re-export commonly used types for convenience
pub use devices::{AnyScannerClient, SharedScannerClient};
pub use error::{ErrorCode, FailureClass, HardwareError, Result};
pub use traits::{ScannerClient, ScannerConnector};
pub use types::{
    DeviceInfo, DoubleFeedCalibration, DoubleSheetDetection, EjectMotion, FormMovement, GrayImage,
    RawStatus, ScanOptions, SheetImages, StatusMode,
};
pub use watcher::{WatchConfig, watch_status};
