//! Common types shared across scanner client implementations.
//!
//! This module defines the raw status snapshot, paper movements, scan options
//! and the grayscale images a scan produces.

use serde::{Deserialize, Serialize};

/// Generic device information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "Mock Scanner").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            firmware_version: None,
        }
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// How a client delivers paper status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMode {
    /// Status must be queried periodically.
    Polling,
    /// The device reports every status change on its own.
    Push,
}

/// Snapshot of the scanner's paper sensors and fault flags.
///
/// Sensors are ordered left to right: left-left, center-left, center-right,
/// right-right. Only the two center sensors at the back reliably detect a
/// sheet held after scanning; the outer output sensors are ignored.
///
/// # Examples
///
/// ```
/// use precinct_hardware::types::RawStatus;
///
/// let status = RawStatus::paper_at_front();
/// assert!(status.all_front());
/// assert!(!status.any_back());
///
/// let jammed = RawStatus::paper_at_back().with_paper_jam();
/// assert!(jammed.is_paper_jam);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawStatus {
    pub front: [bool; 4],
    pub back: [bool; 4],
    pub is_paper_jam: bool,
    pub is_jam_paper_held_back: bool,
    pub is_double_sheet: bool,
    pub is_cover_open: bool,
}

impl RawStatus {
    /// No paper anywhere, no faults.
    #[must_use]
    pub fn no_paper() -> Self {
        Self::default()
    }

    /// A sheet fully inserted at the front.
    #[must_use]
    pub fn paper_at_front() -> Self {
        Self {
            front: [true; 4],
            ..Self::default()
        }
    }

    /// A sheet held at the back after scanning.
    #[must_use]
    pub fn paper_at_back() -> Self {
        Self {
            back: [true; 4],
            ..Self::default()
        }
    }

    /// One sheet at the front and another at the back.
    #[must_use]
    pub fn paper_on_both_sides() -> Self {
        Self {
            front: [true; 4],
            back: [true; 4],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_paper_jam(mut self) -> Self {
        self.is_paper_jam = true;
        self
    }

    #[must_use]
    pub fn with_double_sheet(mut self) -> Self {
        self.is_double_sheet = true;
        self
    }

    #[must_use]
    pub fn with_cover_open(mut self) -> Self {
        self.is_cover_open = true;
        self
    }

    /// All front sensors covered: a sheet is ready to be pulled in.
    #[must_use]
    pub fn all_front(&self) -> bool {
        self.front.iter().all(|&s| s)
    }

    /// At least one front sensor covered.
    #[must_use]
    pub fn any_front(&self) -> bool {
        self.front.iter().any(|&s| s)
    }

    /// Paper on either back-center sensor.
    #[must_use]
    pub fn any_back(&self) -> bool {
        self.back[1] || self.back[2]
    }

    /// Either jam flag set.
    #[must_use]
    pub fn is_jammed(&self) -> bool {
        self.is_paper_jam || self.is_jam_paper_held_back
    }
}

/// Paper movements the transport can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMovement {
    /// Drop a held sheet into the ballot box.
    EjectPaperForward,
    /// Push a held sheet back out the front and hold it there.
    RetractPaperBackward,
    /// Halt the motors.
    Stop,
    /// Pull a freshly inserted sheet to the scan position.
    LoadPaper,
}

/// Where an ejected document ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EjectMotion {
    /// Into the ballot box.
    ToRear,
    /// Out the front, held for removal.
    ToFrontAndHold,
}

impl From<EjectMotion> for FormMovement {
    fn from(motion: EjectMotion) -> Self {
        match motion {
            EjectMotion::ToRear => FormMovement::EjectPaperForward,
            EjectMotion::ToFrontAndHold => FormMovement::RetractPaperBackward,
        }
    }
}

/// Double-sheet (double-feed) detection sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleSheetDetection {
    Disabled,
    #[default]
    Enabled,
}

/// Parameters for a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    pub resolution_dpi: u16,
    pub double_sheet_detection: DoubleSheetDetection,
    /// Keep the sheet at the back after scanning instead of dropping it.
    pub hold_after_scan: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            resolution_dpi: 200,
            double_sheet_detection: DoubleSheetDetection::Enabled,
            hold_after_scan: true,
        }
    }
}

/// Kind of sheet fed during double-feed calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleFeedCalibration {
    SingleSheet,
    DoubleSheet,
}

/// 8-bit grayscale image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl GrayImage {
    /// All-white image of the given size.
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![u8::MAX; width as usize * height as usize],
        }
    }
}

/// Front and back images of one scanned sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetImages {
    pub front: GrayImage,
    pub back: GrayImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_builder() {
        let info = DeviceInfo::new("Scanner", "MK-1").with_firmware_version("2.1.0");
        assert_eq!(info.name, "Scanner");
        assert_eq!(info.firmware_version.as_deref(), Some("2.1.0"));
    }

    #[test]
    fn test_outer_back_sensors_ignored() {
        let status = RawStatus {
            back: [true, false, false, true],
            ..RawStatus::default()
        };
        assert!(!status.any_back());
    }

    #[test]
    fn test_partial_front_is_not_all_front() {
        let status = RawStatus {
            front: [true, true, false, false],
            ..RawStatus::default()
        };
        assert!(status.any_front());
        assert!(!status.all_front());
    }

    #[test]
    fn test_eject_motion_maps_to_movement() {
        assert_eq!(FormMovement::from(EjectMotion::ToRear), FormMovement::EjectPaperForward);
        assert_eq!(
            FormMovement::from(EjectMotion::ToFrontAndHold),
            FormMovement::RetractPaperBackward
        );
    }

    #[test]
    fn test_blank_image_size() {
        let image = GrayImage::blank(4, 3);
        assert_eq!(image.pixels.len(), 12);
        assert!(image.pixels.iter().all(|&p| p == 255));
    }

    #[test]
    fn test_status_serializes() {
        let json = serde_json::to_value(RawStatus::paper_at_front().with_cover_open()).unwrap();
        assert_eq!(json["is_cover_open"], true);
    }
}
