//! Events processed by the controller.

use crate::context::ScannedSheet;
use crate::normalizer::ScannerEvent;
use precinct_core::{Interpretation, ScannerErrorKind};
use precinct_hardware::{ErrorCode, FailureClass, HardwareError, SharedScannerClient};
use std::fmt;

/// Calibration routine run by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Calibration {
    DoubleFeedDetection,
    ImageSensors,
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DoubleFeedDetection => "double_feed_detection",
            Self::ImageSensors => "image_sensors",
        })
    }
}

/// Operator or application command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Scan,
    Accept,
    Return,
    /// Only honored with no paper in the scanner
    BeginCalibration(Calibration),
    /// Leave a finished calibration of the same kind
    EndCalibration(Calibration),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan => f.write_str("scan"),
            Self::Accept => f.write_str("accept"),
            Self::Return => f.write_str("return"),
            Self::BeginCalibration(kind) => write!(f, "begin_calibration({kind})"),
            Self::EndCalibration(kind) => write!(f, "end_calibration({kind})"),
        }
    }
}

/// State timers. Durations come from [`Delays`](crate::config::Delays).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    Reconnect,
    ScanningTimeout,
    JamWhenScanning,
    AppReadyToScan,
    AcceptingTimeout,
    AcceptedReadyForNextBallot,
    WaitForHoldAfterReject,
    WaitForJamCleared,
    /// Each step of the error-recovery region
    RecoveryStep,
    DoubleFeedCalibrationTimeout,
    ImageSensorCalibrationTimeout,
}

/// Why an action executor failed.
#[derive(Debug)]
pub enum ActionFailure {
    Hardware(HardwareError),
    Interpretation(String),
    Archive(std::io::Error),
}

impl ActionFailure {
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Hardware(error) => error.code(),
            _ => None,
        }
    }

    /// Recovery class of the failure.
    #[must_use]
    pub fn classify(&self) -> FailureClass {
        match self {
            Self::Hardware(error) => error.classify(),
            Self::Interpretation(_) => FailureClass::RetryableNow,
            Self::Archive(_) => FailureClass::RetryableAfterReconnect,
        }
    }
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware(error) => write!(f, "hardware: {error}"),
            Self::Interpretation(message) => write!(f, "interpretation: {message}"),
            Self::Archive(error) => write!(f, "image archive: {error}"),
        }
    }
}

impl From<HardwareError> for ActionFailure {
    fn from(error: HardwareError) -> Self {
        Self::Hardware(error)
    }
}

/// Outcome of the action invoked by the current state.
#[derive(Debug)]
pub enum Outcome {
    Connected(SharedScannerClient),
    Scanned(ScannedSheet),
    Interpreted(Interpretation),
    ScanGate(bool),
    /// Movement, reset, calibration or disconnect finished
    Done,
    Failed(ActionFailure),
}

/// Everything the transition function reacts to.
#[derive(Debug)]
pub enum Event {
    Scanner(ScannerEvent),
    /// The status watcher stopped on a fault
    StatusFailed(ScannerErrorKind),
    Command(Command),
    Action(Outcome),
    Timer(Timer),
}

/// Event label for logs and history. Never includes images or votes.
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scanner(event) => write!(f, "scanner:{event}"),
            Self::StatusFailed(kind) => write!(f, "status_failed:{kind}"),
            Self::Command(command) => write!(f, "command:{command}"),
            Self::Action(outcome) => match outcome {
                Outcome::Connected(_) => f.write_str("action:connected"),
                Outcome::Scanned(sheet) => write!(f, "action:scanned({})", sheet.sheet_id),
                Outcome::Interpreted(interpretation) => {
                    write!(f, "action:interpreted({})", interpretation.type_name())
                }
                Outcome::ScanGate(ready) => write!(f, "action:scan_gate({ready})"),
                Outcome::Done => f.write_str("action:done"),
                Outcome::Failed(failure) => write!(f, "action:failed({failure})"),
            },
            Self::Timer(timer) => write!(f, "timer:{timer:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use precinct_core::{PageInterpretation, SheetId, Votes};

    #[test]
    fn test_interpreted_label_hides_votes() {
        let mut votes = Votes::new();
        votes.insert("mayor".to_string(), vec!["alice".to_string()]);
        let event = Event::Action(Outcome::Interpreted(Interpretation::ValidSheet {
            sheet_id: SheetId::new(),
            pages: [
                PageInterpretation {
                    page_number: 1,
                    votes,
                },
                PageInterpretation::default(),
            ],
        }));

        let label = event.to_string();
        assert_eq!(label, "action:interpreted(ValidSheet)");
        assert!(!label.contains("alice"));
    }

    #[test]
    fn test_failure_classification() {
        let jam = ActionFailure::from(HardwareError::device(ErrorCode::PaperJam));
        assert_eq!(jam.code(), Some(ErrorCode::PaperJam));
        assert_eq!(jam.classify(), FailureClass::RetryableAfterReconnect);

        let interpretation = ActionFailure::Interpretation("bad template".to_string());
        assert_eq!(interpretation.classify(), FailureClass::RetryableNow);
        assert_eq!(interpretation.code(), None);
    }

    #[test]
    fn test_event_labels() {
        assert_eq!(Event::Command(Command::Return).to_string(), "command:return");
        assert_eq!(
            Event::Command(Command::BeginCalibration(Calibration::ImageSensors)).to_string(),
            "command:begin_calibration(image_sensors)"
        );
        assert_eq!(
            Event::Scanner(ScannerEvent::JamDoubleSheet).to_string(),
            "scanner:jam_double_sheet"
        );
        assert_eq!(Event::Timer(Timer::RecoveryStep).to_string(), "timer:RecoveryStep");
        assert_eq!(
            Event::StatusFailed(ScannerErrorKind::PaperStatusTimedOut).to_string(),
            "status_failed:paper_status_timed_out"
        );
    }
}
