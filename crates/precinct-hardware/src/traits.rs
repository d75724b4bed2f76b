//! Scanner client traits.
//!
//! [`ScannerClient`] is the command surface of a connected scanner.
//! [`ScannerConnector`] opens new connections; the controller drops and
//! re-creates clients whenever it needs to resynchronize with the device.

#![allow(async_fn_in_trait)]

use crate::devices::AnyScannerClient;
use crate::types::{
    DeviceInfo, DoubleFeedCalibration, EjectMotion, FormMovement, RawStatus, ScanOptions,
    SheetImages, StatusMode,
};
use crate::Result;
use std::future::Future;

/// A connected sheet-fed ballot scanner.
///
/// Implementations come in two flavors distinguished by [`StatusMode`]:
/// polling clients answer [`get_status`](Self::get_status) on demand, push
/// clients additionally block in
/// [`wait_for_status_change`](Self::wait_for_status_change) until the device
/// reports a change.
///
/// # Examples
///
/// ```no_run
/// use precinct_hardware::traits::ScannerClient;
/// use precinct_hardware::types::{FormMovement, ScanOptions};
/// use precinct_hardware::Result;
///
/// async fn scan_and_drop<S: ScannerClient>(scanner: &mut S) -> Result<()> {
///     let _images = scanner.scan(&ScanOptions::default()).await?;
///     scanner.move_paper(FormMovement::EjectPaperForward).await
/// }
/// ```
pub trait ScannerClient: Send + Sync {
    /// How this client delivers status.
    fn status_mode(&self) -> StatusMode;

    /// Read the current sensor snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Device`](crate::HardwareError::Device) with the
    /// firmware code when the device answers with an error, or a transport
    /// error when it cannot be reached.
    async fn get_status(&mut self) -> Result<RawStatus>;

    /// Wait for the next status change reported by the device.
    ///
    /// # Errors
    ///
    /// Polling clients return `Unsupported`.
    async fn wait_for_status_change(&mut self) -> Result<RawStatus>;

    /// Scan the sheet at the front and hold it at the back.
    ///
    /// # Errors
    ///
    /// Returns `NoDocumentToBeScanned` when no sheet is present and
    /// `PaperJam` when the sheet stalls in the transport.
    async fn scan(&mut self, options: &ScanOptions) -> Result<SheetImages>;

    /// Run the transport motors.
    async fn move_paper(&mut self, movement: FormMovement) -> Result<()>;

    /// Eject the held document.
    async fn eject_document(&mut self, motion: EjectMotion) -> Result<()>;

    /// Clear a jam and reinitialize the transport.
    async fn reset_hardware(&mut self) -> Result<()>;

    /// Release the connection. The client is unusable afterwards.
    async fn disconnect(&mut self) -> Result<()>;

    /// Calibrate the ultrasonic double-feed detector.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` on scanners without an ultrasonic sensor.
    async fn calibrate_double_feed_detection(&mut self, kind: DoubleFeedCalibration) -> Result<()>;

    /// Calibrate the image sensors against a blank sheet.
    async fn calibrate_image_sensors(&mut self) -> Result<()>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Opens connections to a scanner.
///
/// Returned futures are `Send` so connection attempts can run on spawned
/// tasks.
pub trait ScannerConnector: Send + Sync + 'static {
    /// Connect to the device and return a ready client.
    ///
    /// # Errors
    ///
    /// Connectivity errors (see
    /// [`HardwareError::is_connectivity`](crate::HardwareError::is_connectivity))
    /// are expected while the device is unplugged; anything else means the
    /// device is in a state the controller cannot recover from.
    fn connect(&self) -> impl Future<Output = Result<AnyScannerClient>> + Send;

    /// Whether the scanner has an ultrasonic double-feed detector.
    ///
    /// Answered without a live connection.
    fn supports_ultrasonic(&self) -> bool;
}
