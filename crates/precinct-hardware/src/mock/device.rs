//! Simulated scanner device shared by the mock clients.

use crate::error::ErrorCode;
use crate::types::{FormMovement, GrayImage, RawStatus, ScanOptions, SheetImages};
use crate::{HardwareError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::debug;

const IMAGE_WIDTH: u32 = 17;
const IMAGE_HEIGHT: u32 = 22;

/// Scripted result for the next scan command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Move the sheet to the back and return blank images.
    Succeed,
    /// Fail with `code`, optionally replacing the sensor snapshot first.
    Fail {
        code: ErrorCode,
        status_after: Option<RawStatus>,
    },
    /// Never return.
    Stall,
}

#[derive(Debug, Default)]
struct DeviceState {
    status: RawStatus,
    offline: bool,
    connected: bool,
    stall_status: bool,
    stall_eject: bool,
    status_failures: VecDeque<ErrorCode>,
    scan_outcomes: VecDeque<ScanOutcome>,
    connect_failures: VecDeque<HardwareError>,
    movement_failures: VecDeque<ErrorCode>,
    reset_failures: VecDeque<ErrorCode>,
    calibration_failures: VecDeque<HardwareError>,
    stall_calibration: bool,
    movements: Vec<FormMovement>,
    last_scan_options: Option<ScanOptions>,
    connect_count: usize,
    scan_count: usize,
    reset_count: usize,
    calibration_count: usize,
}

/// Shared simulated device.
#[derive(Debug, Clone)]
pub(crate) struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
    changes: Arc<watch::Sender<u64>>,
}

enum StatusAnswer {
    Ready(Result<RawStatus>),
    Stalled,
}

impl MockDevice {
    pub(crate) fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(DeviceState::default())),
            changes: Arc::new(changes),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the device and notify push subscribers.
    fn update<R>(&self, f: impl FnOnce(&mut DeviceState) -> R) -> R {
        let result = f(&mut self.lock());
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
        result
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub(crate) fn open(&self) -> Result<()> {
        self.update(|s| {
            s.connect_count += 1;
            if let Some(error) = s.connect_failures.pop_front() {
                return Err(error);
            }
            if s.offline {
                return Err(HardwareError::device(ErrorCode::ScannerOffline));
            }
            s.connected = true;
            Ok(())
        })
    }

    pub(crate) fn close(&self) {
        self.update(|s| s.connected = false);
    }

    fn ensure_reachable(s: &DeviceState) -> Result<()> {
        if s.offline {
            return Err(HardwareError::device(ErrorCode::ScannerOffline));
        }
        if !s.connected {
            return Err(HardwareError::disconnected("mock scanner"));
        }
        Ok(())
    }

    pub(crate) async fn status(&self) -> Result<RawStatus> {
        let answer = {
            let mut s = self.lock();
            match Self::ensure_reachable(&s) {
                Err(error) => StatusAnswer::Ready(Err(error)),
                Ok(()) => match s.status_failures.pop_front() {
                    Some(code) => StatusAnswer::Ready(Err(HardwareError::device(code))),
                    None if s.stall_status => StatusAnswer::Stalled,
                    None => StatusAnswer::Ready(Ok(s.status)),
                },
            }
        };

        match answer {
            StatusAnswer::Ready(result) => result,
            StatusAnswer::Stalled => std::future::pending().await,
        }
    }

    pub(crate) async fn scan(&self, options: &ScanOptions) -> Result<SheetImages> {
        let outcome = self.update(|s| {
            Self::ensure_reachable(s)?;
            s.scan_count += 1;
            s.last_scan_options = Some(*options);

            match s.scan_outcomes.pop_front().unwrap_or(ScanOutcome::Succeed) {
                ScanOutcome::Succeed => {
                    if !s.status.all_front() || s.status.any_back() {
                        return Err(HardwareError::device(ErrorCode::NoDocumentToBeScanned));
                    }
                    s.status.front = [false; 4];
                    if options.hold_after_scan {
                        s.status.back = [true; 4];
                    }
                    Ok(Some(SheetImages {
                        front: GrayImage::blank(IMAGE_WIDTH, IMAGE_HEIGHT),
                        back: GrayImage::blank(IMAGE_WIDTH, IMAGE_HEIGHT),
                    }))
                }
                ScanOutcome::Fail { code, status_after } => {
                    if let Some(status) = status_after {
                        s.status = status;
                    }
                    Err(HardwareError::device(code))
                }
                ScanOutcome::Stall => Ok(None),
            }
        })?;

        match outcome {
            Some(images) => Ok(images),
            None => std::future::pending().await,
        }
    }

    pub(crate) fn move_paper(&self, movement: FormMovement) -> Result<()> {
        self.update(|s| {
            Self::ensure_reachable(s)?;
            s.movements.push(movement);
            if let Some(code) = s.movement_failures.pop_front() {
                return Err(HardwareError::device(code));
            }

            match movement {
                FormMovement::EjectPaperForward => {
                    if !s.stall_eject {
                        s.status.back = [false; 4];
                    }
                }
                FormMovement::RetractPaperBackward => {
                    if s.status.any_back() {
                        s.status.back = [false; 4];
                        s.status.front = [true; 4];
                    }
                }
                FormMovement::LoadPaper => {
                    s.status.back = [false; 4];
                }
                FormMovement::Stop => {}
            }
            debug!("Mock scanner moved paper: {:?}", movement);
            Ok(())
        })
    }

    pub(crate) fn reset(&self) -> Result<()> {
        self.update(|s| {
            Self::ensure_reachable(s)?;
            s.reset_count += 1;
            if let Some(code) = s.reset_failures.pop_front() {
                return Err(HardwareError::device(code));
            }
            s.status.is_paper_jam = false;
            s.status.is_jam_paper_held_back = false;
            s.status.is_double_sheet = false;
            Ok(())
        })
    }

    pub(crate) async fn calibrate(&self) -> Result<()> {
        let stalled = self.update(|s| {
            Self::ensure_reachable(s)?;
            s.calibration_count += 1;
            match s.calibration_failures.pop_front() {
                Some(error) => Err(error),
                None => Ok(s.stall_calibration),
            }
        })?;

        if stalled {
            std::future::pending().await
        }
        Ok(())
    }
}

/// Handle for scripting a simulated scanner.
///
/// Cloning the handle yields another view of the same device.
///
/// # Examples
///
/// ```
/// use precinct_hardware::mock::MockScanner;
/// use precinct_hardware::traits::ScannerClient;
/// use precinct_hardware::types::ScanOptions;
///
/// #[tokio::main]
/// async fn main() -> precinct_hardware::Result<()> {
///     let (mut scanner, handle) = MockScanner::new();
///
///     handle.insert_sheet();
///     scanner.scan(&ScanOptions::default()).await?;
///
///     assert_eq!(handle.scan_count(), 1);
///     assert!(handle.status().any_back());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockScannerHandle {
    device: MockDevice,
}

impl MockScannerHandle {
    pub(crate) fn new(device: MockDevice) -> Self {
        Self { device }
    }

    /// Current sensor snapshot.
    pub fn status(&self) -> RawStatus {
        self.device.lock().status
    }

    /// Replace the sensor snapshot.
    pub fn set_status(&self, status: RawStatus) {
        self.device.update(|s| s.status = status);
    }

    /// Insert a sheet at the front, leaving the back untouched.
    pub fn insert_sheet(&self) {
        self.device.update(|s| s.status.front = [true; 4]);
    }

    /// Take all paper out of the transport. Fault flags stay set.
    pub fn remove_paper(&self) {
        self.device.update(|s| {
            s.status.front = [false; 4];
            s.status.back = [false; 4];
        });
    }

    /// Raise the jam flag, optionally reporting a double sheet.
    pub fn jam(&self, double_sheet: bool) {
        self.device.update(|s| {
            s.status.is_paper_jam = true;
            s.status.is_double_sheet = double_sheet;
        });
    }

    pub fn open_cover(&self) {
        self.device.update(|s| s.status.is_cover_open = true);
    }

    pub fn close_cover(&self) {
        self.device.update(|s| s.status.is_cover_open = false);
    }

    /// Unplug the device: every call fails with `ScannerOffline`.
    pub fn go_offline(&self) {
        self.device.update(|s| s.offline = true);
    }

    pub fn go_online(&self) {
        self.device.update(|s| s.offline = false);
    }

    /// Fail the next status query with `code`.
    pub fn queue_status_failure(&self, code: ErrorCode) {
        self.device.update(|s| s.status_failures.push_back(code));
    }

    /// Make status queries hang until cleared.
    pub fn stall_status(&self, stall: bool) {
        self.device.update(|s| s.stall_status = stall);
    }

    /// Script the outcome of the next scan.
    pub fn queue_scan_outcome(&self, outcome: ScanOutcome) {
        self.device.update(|s| s.scan_outcomes.push_back(outcome));
    }

    /// Fail the next connection attempt with `error`.
    pub fn queue_connect_failure(&self, error: HardwareError) {
        self.device.update(|s| s.connect_failures.push_back(error));
    }

    /// Fail the next paper movement with `code`.
    pub fn queue_movement_failure(&self, code: ErrorCode) {
        self.device.update(|s| s.movement_failures.push_back(code));
    }

    /// Fail the next hardware reset with `code`.
    pub fn queue_reset_failure(&self, code: ErrorCode) {
        self.device.update(|s| s.reset_failures.push_back(code));
    }

    /// Fail the next calibration with `error`.
    pub fn queue_calibration_failure(&self, error: HardwareError) {
        self.device.update(|s| s.calibration_failures.push_back(error));
    }

    /// Make calibrations hang until cleared, as if waiting for paper.
    pub fn stall_calibration(&self, stall: bool) {
        self.device.update(|s| s.stall_calibration = stall);
    }

    /// Keep ejected sheets at the back, as if the motor were slow.
    pub fn stall_eject(&self, stall: bool) {
        self.device.update(|s| s.stall_eject = stall);
    }

    /// Every paper movement commanded so far.
    pub fn movements(&self) -> Vec<FormMovement> {
        self.device.lock().movements.clone()
    }

    pub fn last_scan_options(&self) -> Option<ScanOptions> {
        self.device.lock().last_scan_options
    }

    pub fn is_connected(&self) -> bool {
        self.device.lock().connected
    }

    pub fn connect_count(&self) -> usize {
        self.device.lock().connect_count
    }

    pub fn scan_count(&self) -> usize {
        self.device.lock().scan_count
    }

    pub fn reset_count(&self) -> usize {
        self.device.lock().reset_count
    }

    pub fn calibration_count(&self) -> usize {
        self.device.lock().calibration_count
    }
}
