//! Controller states.
//!
//! The state is a flat enum. Regions with internal steps carry a phase enum
//! (`Scanning(ScanningPhase::CheckingCompleted)`); the phase only changes
//! what the state is waiting on, never how the region answers global events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connect retry loop after a connectivity loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectPhase {
    WaitingToRetry,
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyToScanPhase {
    CheckingAppReady,
    WaitingForApp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanningPhase {
    Starting,
    CheckingCompleted,
    HandlingJam,
    RoutingJam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpretingPhase {
    Starting,
    /// Transient: resolved immediately on entry
    RoutingResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptingPhase {
    Starting,
    CheckingCompleted,
    FinishingAccept,
    StoppingForReinsert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptedPhase {
    ScanningPaused,
}

/// Shared by rejecting, returning and returning-to-rescan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectingPhase {
    Starting,
    CheckingCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JamPhase {
    RejectingPaper,
    CheckingComplete,
}

/// Reset and resynchronize after a jam has cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPhase {
    Resetting,
    WaitingToReconnect,
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPhase {
    Disconnecting,
    CoolingOff,
    Reconnecting,
    UnexpectedError,
}

/// Double-feed detector calibration: two sheets, then one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleFeedCalibrationPhase {
    DoubleSheet,
    SingleSheet,
    Done,
    /// Resynchronizing with the paper path before returning to service
    Ending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSensorCalibrationPhase {
    Calibrating,
    Done,
    Ending,
}

/// Internal controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "phase", rename_all = "snake_case")]
pub enum State {
    Connecting,
    Disconnected(ReconnectPhase),
    UnrecoverableError,
    CheckingInitialPaperStatus,
    CheckingPaperStatusAfterScan,
    NoPaper,
    ReadyToScan(ReadyToScanPhase),
    Scanning(ScanningPhase),
    Interpreting(InterpretingPhase),
    ReadyToAccept,
    Accepting(AcceptingPhase),
    AcceptingAfterReview(AcceptingPhase),
    Accepted(AcceptedPhase),
    NeedsReview,
    Rejecting(RejectingPhase),
    Rejected,
    Returning(RejectingPhase),
    Returned,
    ReturningToRescan(RejectingPhase),
    Jam(JamPhase),
    InternalJam,
    DoubleSheet,
    JamCleared(RecoveryPhase),
    DoubleSheetJamCleared(RecoveryPhase),
    BothSidesHavePaper,
    Error(ErrorPhase),
    CalibratingDoubleFeedDetection(DoubleFeedCalibrationPhase),
    CalibratingImageSensors(ImageSensorCalibrationPhase),
}

impl State {
    pub const INITIAL: State = State::Connecting;

    /// Region name without the phase.
    #[must_use]
    pub fn region(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Disconnected(_) => "disconnected",
            Self::UnrecoverableError => "unrecoverable_error",
            Self::CheckingInitialPaperStatus => "checking_initial_paper_status",
            Self::CheckingPaperStatusAfterScan => "checking_paper_status_after_scan",
            Self::NoPaper => "no_paper",
            Self::ReadyToScan(_) => "ready_to_scan",
            Self::Scanning(_) => "scanning",
            Self::Interpreting(_) => "interpreting",
            Self::ReadyToAccept => "ready_to_accept",
            Self::Accepting(_) => "accepting",
            Self::AcceptingAfterReview(_) => "accepting_after_review",
            Self::Accepted(_) => "accepted",
            Self::NeedsReview => "needs_review",
            Self::Rejecting(_) => "rejecting",
            Self::Rejected => "rejected",
            Self::Returning(_) => "returning",
            Self::Returned => "returned",
            Self::ReturningToRescan(_) => "returning_to_rescan",
            Self::Jam(_) => "jam",
            Self::InternalJam => "internal_jam",
            Self::DoubleSheet => "double_sheet",
            Self::JamCleared(_) => "jam_cleared",
            Self::DoubleSheetJamCleared(_) => "double_sheet_jam_cleared",
            Self::BothSidesHavePaper => "both_sides_have_paper",
            Self::Error(_) => "error",
            Self::CalibratingDoubleFeedDetection(_) => "calibrating_double_feed_detection",
            Self::CalibratingImageSensors(_) => "calibrating_image_sensors",
        }
    }

    #[must_use]
    pub fn phase(&self) -> Option<&'static str> {
        let phase = match self {
            Self::Disconnected(ReconnectPhase::WaitingToRetry) => "waiting_to_retry",
            Self::Disconnected(ReconnectPhase::Reconnecting) => "reconnecting",
            Self::ReadyToScan(ReadyToScanPhase::CheckingAppReady) => "checking_app_ready",
            Self::ReadyToScan(ReadyToScanPhase::WaitingForApp) => "waiting_for_app",
            Self::Scanning(phase) => match phase {
                ScanningPhase::Starting => "starting",
                ScanningPhase::CheckingCompleted => "checking_completed",
                ScanningPhase::HandlingJam => "handling_jam",
                ScanningPhase::RoutingJam => "routing_jam",
            },
            Self::Interpreting(InterpretingPhase::Starting) => "starting",
            Self::Interpreting(InterpretingPhase::RoutingResult) => "routing_result",
            Self::Accepting(phase) | Self::AcceptingAfterReview(phase) => match phase {
                AcceptingPhase::Starting => "starting",
                AcceptingPhase::CheckingCompleted => "checking_completed",
                AcceptingPhase::FinishingAccept => "finishing_accept",
                AcceptingPhase::StoppingForReinsert => "stopping_for_reinsert",
            },
            Self::Accepted(AcceptedPhase::ScanningPaused) => "scanning_paused",
            Self::Rejecting(phase) | Self::Returning(phase) | Self::ReturningToRescan(phase) => {
                match phase {
                    RejectingPhase::Starting => "starting",
                    RejectingPhase::CheckingCompleted => "checking_completed",
                }
            }
            Self::Jam(JamPhase::RejectingPaper) => "rejecting_paper",
            Self::Jam(JamPhase::CheckingComplete) => "checking_complete",
            Self::JamCleared(phase) | Self::DoubleSheetJamCleared(phase) => match phase {
                RecoveryPhase::Resetting => "resetting",
                RecoveryPhase::WaitingToReconnect => "waiting_to_reconnect",
                RecoveryPhase::Reconnecting => "reconnecting",
            },
            Self::Error(phase) => match phase {
                ErrorPhase::Disconnecting => "disconnecting",
                ErrorPhase::CoolingOff => "cooling_off",
                ErrorPhase::Reconnecting => "reconnecting",
                ErrorPhase::UnexpectedError => "unexpected_error",
            },
            Self::CalibratingDoubleFeedDetection(phase) => match phase {
                DoubleFeedCalibrationPhase::DoubleSheet => "double_sheet",
                DoubleFeedCalibrationPhase::SingleSheet => "single_sheet",
                DoubleFeedCalibrationPhase::Done => "done",
                DoubleFeedCalibrationPhase::Ending => "ending",
            },
            Self::CalibratingImageSensors(phase) => match phase {
                ImageSensorCalibrationPhase::Calibrating => "calibrating",
                ImageSensorCalibrationPhase::Done => "done",
                ImageSensorCalibrationPhase::Ending => "ending",
            },
            _ => return None,
        };
        Some(phase)
    }

    /// States resolved immediately on entry, never observed at rest.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Interpreting(InterpretingPhase::RoutingResult))
    }

    /// Coarse state name shown to the application.
    #[must_use]
    pub fn public(&self) -> PublicState {
        match self {
            Self::Connecting => PublicState::Connecting,
            Self::Disconnected(_) => PublicState::Disconnected,
            Self::UnrecoverableError => PublicState::UnrecoverableError,
            Self::CheckingInitialPaperStatus => PublicState::Connecting,
            Self::CheckingPaperStatusAfterScan | Self::Accepted(_) => PublicState::Accepted,
            Self::NoPaper => PublicState::NoPaper,
            Self::ReadyToScan(_) => PublicState::HardwareReadyToScan,
            Self::Scanning(_) | Self::Interpreting(_) => PublicState::Scanning,
            Self::ReadyToAccept => PublicState::ReadyToAccept,
            Self::Accepting(_) => PublicState::Accepting,
            Self::AcceptingAfterReview(_) => PublicState::AcceptingAfterReview,
            Self::NeedsReview => PublicState::NeedsReview,
            Self::Rejecting(_) => PublicState::Rejecting,
            Self::Rejected => PublicState::Rejected,
            Self::Returning(_) => PublicState::Returning,
            Self::Returned => PublicState::Returned,
            Self::ReturningToRescan(_) => PublicState::ReturningToRescan,
            Self::Jam(_) | Self::InternalJam | Self::JamCleared(_) => PublicState::Jammed,
            Self::DoubleSheet | Self::DoubleSheetJamCleared(_) => PublicState::DoubleSheetJammed,
            Self::BothSidesHavePaper => PublicState::BothSidesHavePaper,
            Self::Error(_) => PublicState::RecoveringFromError,
            Self::CalibratingDoubleFeedDetection(phase) => match phase {
                DoubleFeedCalibrationPhase::DoubleSheet => {
                    PublicState::CalibratingDoubleFeedDetectionDoubleSheet
                }
                DoubleFeedCalibrationPhase::SingleSheet => {
                    PublicState::CalibratingDoubleFeedDetectionSingleSheet
                }
                DoubleFeedCalibrationPhase::Done | DoubleFeedCalibrationPhase::Ending => {
                    PublicState::CalibratingDoubleFeedDetectionDone
                }
            },
            Self::CalibratingImageSensors(phase) => match phase {
                ImageSensorCalibrationPhase::Calibrating => {
                    PublicState::CalibratingImageSensorsCalibrating
                }
                ImageSensorCalibrationPhase::Done | ImageSensorCalibrationPhase::Ending => {
                    PublicState::CalibratingImageSensorsDone
                }
            },
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase() {
            Some(phase) => write!(f, "{}.{}", self.region(), phase),
            None => f.write_str(self.region()),
        }
    }
}

/// State as reported through the public status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicState {
    Connecting,
    Disconnected,
    NoPaper,
    HardwareReadyToScan,
    Scanning,
    ReadyToAccept,
    Accepting,
    Accepted,
    NeedsReview,
    AcceptingAfterReview,
    Returning,
    ReturningToRescan,
    Returned,
    Rejecting,
    Rejected,
    Jammed,
    DoubleSheetJammed,
    BothSidesHavePaper,
    RecoveringFromError,
    UnrecoverableError,
    #[serde(rename = "calibrating_double_feed_detection.double_sheet")]
    CalibratingDoubleFeedDetectionDoubleSheet,
    #[serde(rename = "calibrating_double_feed_detection.single_sheet")]
    CalibratingDoubleFeedDetectionSingleSheet,
    #[serde(rename = "calibrating_double_feed_detection.done")]
    CalibratingDoubleFeedDetectionDone,
    #[serde(rename = "calibrating_image_sensors.calibrating")]
    CalibratingImageSensorsCalibrating,
    #[serde(rename = "calibrating_image_sensors.done")]
    CalibratingImageSensorsDone,
}

impl PublicState {
    /// Whether the status may carry an error code in this state.
    #[must_use]
    pub fn shows_error(&self) -> bool {
        matches!(
            self,
            Self::Rejecting
                | Self::Rejected
                | Self::RecoveringFromError
                | Self::CalibratingDoubleFeedDetectionDone
                | Self::CalibratingImageSensorsDone
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(State::Connecting, "connecting")]
    #[case(State::Scanning(ScanningPhase::RoutingJam), "scanning.routing_jam")]
    #[case(
        State::AcceptingAfterReview(AcceptingPhase::StoppingForReinsert),
        "accepting_after_review.stopping_for_reinsert"
    )]
    #[case(
        State::DoubleSheetJamCleared(RecoveryPhase::WaitingToReconnect),
        "double_sheet_jam_cleared.waiting_to_reconnect"
    )]
    #[case(State::Error(ErrorPhase::CoolingOff), "error.cooling_off")]
    fn test_state_display(#[case] state: State, #[case] expected: &str) {
        assert_eq!(state.to_string(), expected);
    }

    #[rstest]
    #[case(State::CheckingInitialPaperStatus, PublicState::Connecting)]
    #[case(State::CheckingPaperStatusAfterScan, PublicState::Accepted)]
    #[case(State::Interpreting(InterpretingPhase::Starting), PublicState::Scanning)]
    #[case(State::Jam(JamPhase::RejectingPaper), PublicState::Jammed)]
    #[case(State::JamCleared(RecoveryPhase::Resetting), PublicState::Jammed)]
    #[case(
        State::DoubleSheetJamCleared(RecoveryPhase::Reconnecting),
        PublicState::DoubleSheetJammed
    )]
    #[case(State::Error(ErrorPhase::UnexpectedError), PublicState::RecoveringFromError)]
    fn test_public_projection(#[case] state: State, #[case] expected: PublicState) {
        assert_eq!(state.public(), expected);
    }

    #[test]
    fn test_error_allow_list() {
        assert!(PublicState::Rejecting.shows_error());
        assert!(PublicState::RecoveringFromError.shows_error());
        assert!(!PublicState::NoPaper.shows_error());
        assert!(!PublicState::UnrecoverableError.shows_error());
    }

    #[test]
    fn test_public_state_serialization() {
        let json = serde_json::to_string(&PublicState::HardwareReadyToScan).unwrap();
        assert_eq!(json, "\"hardware_ready_to_scan\"");
    }

    #[rstest]
    #[case(
        State::CalibratingDoubleFeedDetection(DoubleFeedCalibrationPhase::SingleSheet),
        "\"calibrating_double_feed_detection.single_sheet\""
    )]
    #[case(
        State::CalibratingDoubleFeedDetection(DoubleFeedCalibrationPhase::Ending),
        "\"calibrating_double_feed_detection.done\""
    )]
    #[case(
        State::CalibratingImageSensors(ImageSensorCalibrationPhase::Calibrating),
        "\"calibrating_image_sensors.calibrating\""
    )]
    fn test_calibration_public_names(#[case] state: State, #[case] expected: &str) {
        assert_eq!(serde_json::to_string(&state.public()).unwrap(), expected);
    }

    #[test]
    fn test_calibration_result_shows_error() {
        assert!(PublicState::CalibratingImageSensorsDone.shows_error());
        assert!(PublicState::CalibratingDoubleFeedDetectionDone.shows_error());
        assert!(!PublicState::CalibratingImageSensorsCalibrating.shows_error());
    }

    #[test]
    fn test_only_routing_is_transient() {
        assert!(State::Interpreting(InterpretingPhase::RoutingResult).is_transient());
        assert!(!State::Interpreting(InterpretingPhase::Starting).is_transient());
        assert!(!State::default().is_transient());
    }
}
