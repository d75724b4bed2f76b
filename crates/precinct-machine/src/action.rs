//! What a state does while it is active.
//!
//! Entering a state starts at most one action executor, an optional paper
//! status watcher and any number of timers. All three are cancelled when the
//! state is left.

use crate::event::Timer;
use crate::state::*;
use precinct_core::{SheetId, SheetPages};
use precinct_hardware::{DoubleFeedCalibration, EjectMotion, FormMovement};

/// Action executor invoked on state entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Connect,
    Disconnect,
    Scan,
    Interpret,
    CheckScanGate,
    Eject(EjectMotion),
    Move(FormMovement),
    /// Stop the transport and pull the next sheet back into position
    StopAndReload,
    ResetHardware,
    CalibrateDoubleFeed(DoubleFeedCalibration),
    CalibrateImageSensors,
}

/// Status watcher cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollRate {
    Normal,
    DuringAccept,
}

/// Activities started on entry to a state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPlan {
    pub action: Option<Action>,
    pub poll: Option<PollRate>,
    pub timers: Vec<Timer>,
}

impl EntryPlan {
    fn action(action: Action) -> Self {
        Self {
            action: Some(action),
            ..Self::default()
        }
    }

    fn poll() -> Self {
        Self {
            poll: Some(PollRate::Normal),
            ..Self::default()
        }
    }

    fn timer(timer: Timer) -> Self {
        Self {
            timers: vec![timer],
            ..Self::default()
        }
    }

    fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    fn with_timer(mut self, timer: Timer) -> Self {
        self.timers.push(timer);
        self
    }
}

impl State {
    /// Activities for this state.
    #[must_use]
    pub fn entry_plan(&self) -> EntryPlan {
        match *self {
            State::Connecting => EntryPlan::action(Action::Connect),
            State::Disconnected(ReconnectPhase::WaitingToRetry) => {
                EntryPlan::timer(Timer::Reconnect)
            }
            State::Disconnected(ReconnectPhase::Reconnecting) => EntryPlan::action(Action::Connect),
            State::UnrecoverableError => EntryPlan::default(),

            State::CheckingInitialPaperStatus
            | State::CheckingPaperStatusAfterScan
            | State::NoPaper
            | State::ReadyToAccept
            | State::NeedsReview
            | State::Rejected
            | State::Returned
            | State::InternalJam
            | State::DoubleSheet
            | State::BothSidesHavePaper => EntryPlan::poll(),

            State::ReadyToScan(ReadyToScanPhase::CheckingAppReady) => {
                EntryPlan::poll().with_action(Action::CheckScanGate)
            }
            State::ReadyToScan(ReadyToScanPhase::WaitingForApp) => {
                EntryPlan::poll().with_timer(Timer::AppReadyToScan)
            }

            State::Scanning(ScanningPhase::Starting) => {
                EntryPlan::action(Action::Scan).with_timer(Timer::ScanningTimeout)
            }
            State::Scanning(ScanningPhase::CheckingCompleted) => EntryPlan::poll(),
            State::Scanning(ScanningPhase::HandlingJam) => EntryPlan::timer(Timer::JamWhenScanning),
            State::Scanning(ScanningPhase::RoutingJam) => EntryPlan::poll(),

            State::Interpreting(InterpretingPhase::Starting) => {
                EntryPlan::action(Action::Interpret)
            }
            State::Interpreting(InterpretingPhase::RoutingResult) => EntryPlan::default(),

            State::Accepting(phase) | State::AcceptingAfterReview(phase) => match phase {
                AcceptingPhase::Starting => EntryPlan::action(Action::Eject(EjectMotion::ToRear)),
                AcceptingPhase::CheckingCompleted => EntryPlan {
                    poll: Some(PollRate::DuringAccept),
                    ..EntryPlan::timer(Timer::AcceptingTimeout)
                },
                AcceptingPhase::FinishingAccept => {
                    EntryPlan::action(Action::Move(FormMovement::Stop))
                }
                AcceptingPhase::StoppingForReinsert => EntryPlan::action(Action::StopAndReload),
            },
            State::Accepted(AcceptedPhase::ScanningPaused) => {
                EntryPlan::timer(Timer::AcceptedReadyForNextBallot)
            }

            State::Rejecting(phase) | State::Returning(phase) | State::ReturningToRescan(phase) => {
                match phase {
                    RejectingPhase::Starting => {
                        EntryPlan::action(Action::Eject(EjectMotion::ToFrontAndHold))
                    }
                    RejectingPhase::CheckingCompleted => {
                        EntryPlan::poll().with_timer(Timer::WaitForHoldAfterReject)
                    }
                }
            }

            State::Jam(JamPhase::RejectingPaper) => {
                EntryPlan::action(Action::Eject(EjectMotion::ToFrontAndHold))
            }
            State::Jam(JamPhase::CheckingComplete) => {
                EntryPlan::poll().with_timer(Timer::WaitForJamCleared)
            }

            State::JamCleared(phase) | State::DoubleSheetJamCleared(phase) => match phase {
                RecoveryPhase::Resetting => EntryPlan::action(Action::ResetHardware),
                RecoveryPhase::WaitingToReconnect => EntryPlan::timer(Timer::Reconnect),
                RecoveryPhase::Reconnecting => EntryPlan::action(Action::Connect),
            },

            State::Error(phase) => match phase {
                ErrorPhase::Disconnecting => {
                    EntryPlan::action(Action::Disconnect).with_timer(Timer::RecoveryStep)
                }
                ErrorPhase::CoolingOff | ErrorPhase::UnexpectedError => {
                    EntryPlan::timer(Timer::RecoveryStep)
                }
                ErrorPhase::Reconnecting => EntryPlan::action(Action::Connect),
            },

            // No watcher while calibrating: the device is busy with the routine.
            State::CalibratingDoubleFeedDetection(phase) => match phase {
                DoubleFeedCalibrationPhase::DoubleSheet => {
                    let action = Action::CalibrateDoubleFeed(DoubleFeedCalibration::DoubleSheet);
                    EntryPlan::action(action).with_timer(Timer::DoubleFeedCalibrationTimeout)
                }
                DoubleFeedCalibrationPhase::SingleSheet => {
                    let action = Action::CalibrateDoubleFeed(DoubleFeedCalibration::SingleSheet);
                    EntryPlan::action(action).with_timer(Timer::DoubleFeedCalibrationTimeout)
                }
                DoubleFeedCalibrationPhase::Done | DoubleFeedCalibrationPhase::Ending => {
                    EntryPlan::poll()
                }
            },
            State::CalibratingImageSensors(phase) => match phase {
                ImageSensorCalibrationPhase::Calibrating => {
                    EntryPlan::action(Action::CalibrateImageSensors)
                        .with_timer(Timer::ImageSensorCalibrationTimeout)
                }
                ImageSensorCalibrationPhase::Done | ImageSensorCalibrationPhase::Ending => {
                    EntryPlan::poll()
                }
            },
        }
    }
}

/// Store write requested by a transition.
///
/// Carries everything the store needs so the write does not depend on the
/// context at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RecordAccepted {
        sheet_id: SheetId,
        pages: SheetPages,
        adjudicated: bool,
    },
    /// Stored already deleted, so it is kept for audit but never tabulated
    RecordRejected {
        sheet_id: SheetId,
        pages: SheetPages,
    },
}

impl Effect {
    #[must_use]
    pub fn sheet_id(&self) -> SheetId {
        match self {
            Self::RecordAccepted { sheet_id, .. } | Self::RecordRejected { sheet_id, .. } => {
                *sheet_id
            }
        }
    }
}
