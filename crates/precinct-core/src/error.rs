use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid sheet id: {0}")]
    InvalidSheetId(String),

    #[error("Invalid batch id: {0}")]
    InvalidBatchId(String),

    #[error("Unknown scanner error code: {0}")]
    UnknownErrorKind(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Domain errors raised by the scanner controller.
///
/// Each kind has a stable snake_case code that is safe to show in the
/// public status and to persist in logs. Codes never change once released.
///
/// # Examples
///
/// ```
/// use precinct_core::ScannerErrorKind;
///
/// assert_eq!(ScannerErrorKind::ScanningTimedOut.code(), "scanning_timed_out");
/// assert_eq!(
///     "paper_in_back_after_reconnect".parse::<ScannerErrorKind>().unwrap(),
///     ScannerErrorKind::PaperInBackAfterReconnect
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerErrorKind {
    /// An event arrived that the current state does not handle
    UnexpectedEvent,
    /// A status query returned an error code with no event mapping
    UnexpectedPaperStatus,
    /// A status query did not answer in time
    PaperStatusTimedOut,
    /// The scan command did not complete in time
    ScanningTimedOut,
    /// The scanner reported there was nothing to scan
    ScanningFailed,
    /// An accepted sheet never left the back of the transport
    PaperInBackAfterAccept,
    /// Paper sat at the front when the connection was re-established
    PaperInFrontAfterReconnect,
    /// Paper sat at the back when the connection was re-established
    PaperInBackAfterReconnect,
    /// Paper sat on both sides when the connection was re-established
    PaperInBothSidesAfterReconnect,
    /// Both sides had paper with nothing scanned to route
    BothSidesHavePaper,
    /// The interpretation gateway returned an error
    InterpretationFailed,
    /// Connecting failed for a reason other than the device being offline
    UnexpectedConnectFailure,
    /// A double-feed calibration step did not finish in time
    DoubleFeedCalibrationTimedOut,
    /// Image sensor calibration did not finish in time
    ImageSensorCalibrationTimedOut,
    /// The scanner reported that image sensor calibration failed
    ImageSensorCalibrationFailed,
}

impl ScannerErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [ScannerErrorKind; 15] = [
        Self::UnexpectedEvent,
        Self::UnexpectedPaperStatus,
        Self::PaperStatusTimedOut,
        Self::ScanningTimedOut,
        Self::ScanningFailed,
        Self::PaperInBackAfterAccept,
        Self::PaperInFrontAfterReconnect,
        Self::PaperInBackAfterReconnect,
        Self::PaperInBothSidesAfterReconnect,
        Self::BothSidesHavePaper,
        Self::InterpretationFailed,
        Self::UnexpectedConnectFailure,
        Self::DoubleFeedCalibrationTimedOut,
        Self::ImageSensorCalibrationTimedOut,
        Self::ImageSensorCalibrationFailed,
    ];

    /// Stable string code for this kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnexpectedEvent => "unexpected_event",
            Self::UnexpectedPaperStatus => "unexpected_paper_status",
            Self::PaperStatusTimedOut => "paper_status_timed_out",
            Self::ScanningTimedOut => "scanning_timed_out",
            Self::ScanningFailed => "scanning_failed",
            Self::PaperInBackAfterAccept => "paper_in_back_after_accept",
            Self::PaperInFrontAfterReconnect => "paper_in_front_after_reconnect",
            Self::PaperInBackAfterReconnect => "paper_in_back_after_reconnect",
            Self::PaperInBothSidesAfterReconnect => "paper_in_both_sides_after_reconnect",
            Self::BothSidesHavePaper => "both_sides_have_paper",
            Self::InterpretationFailed => "interpretation_failed",
            Self::UnexpectedConnectFailure => "unexpected_connect_failure",
            Self::DoubleFeedCalibrationTimedOut => "double_feed_calibration_timed_out",
            Self::ImageSensorCalibrationTimedOut => "image_sensor_calibration_timed_out",
            Self::ImageSensorCalibrationFailed => "image_sensor_calibration_failed",
        }
    }
}

impl fmt::Display for ScannerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for ScannerErrorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == s)
            .ok_or_else(|| Error::UnknownErrorKind(s.to_string()))
    }
}
