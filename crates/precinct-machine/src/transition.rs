//! The transition function.
//!
//! [`step`] is pure: given the current state, the context and one event, it
//! mutates the context, picks the next state and returns the store writes
//! the runner must perform. It never touches hardware, timers or the store
//! itself, so every routing decision can be tested without a runtime.

use crate::action::Effect;
use crate::context::Context;
use crate::error::MachineFault;
use crate::event::{ActionFailure, Calibration, Command, Event, Outcome, Timer};
use crate::normalizer::ScannerEvent;
use crate::state::*;
use precinct_core::{Interpretation, ScannerErrorKind};
use precinct_hardware::{ErrorCode, FailureClass, HardwareError};
use tracing::warn;

/// Operator settings consulted by the transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub max_failed_scan_attempts: u32,
    pub shoeshine_mode: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_failed_scan_attempts: precinct_core::constants::MAX_FAILED_SCAN_ATTEMPTS,
            shoeshine_mode: false,
        }
    }
}

/// Result of processing one event.
#[derive(Debug, PartialEq, Eq)]
pub struct Step {
    pub state: State,
    /// Whether a state was entered (possibly the same one again)
    pub entered: bool,
    pub effects: Vec<Effect>,
}

enum Handled {
    Stay,
    Go(State),
    Unhandled(Event),
}

use Handled::{Go, Stay, Unhandled};

/// Process one event.
pub fn step(state: &State, ctx: &mut Context, event: Event, policy: &Policy) -> Step {
    let target = match dispatch(state, ctx, event, policy) {
        Stay => None,
        Go(next) => Some(next),
        Unhandled(event) => global(ctx, event),
    };

    match target {
        None => Step {
            state: *state,
            entered: false,
            effects: Vec::new(),
        },
        Some(next) => {
            let mut effects = Vec::new();
            let state = enter(state, next, ctx, &mut effects);
            Step {
                state,
                entered: true,
                effects,
            }
        }
    }
}

fn fail(ctx: &mut Context, fault: impl Into<MachineFault>) -> Handled {
    ctx.error = Some(fault.into());
    Go(State::Error(ErrorPhase::Disconnecting))
}

fn fail_with(ctx: &mut Context, failure: &ActionFailure) -> Handled {
    match failure {
        ActionFailure::Hardware(error) => fail(ctx, error),
        ActionFailure::Interpretation(_) => fail(ctx, ScannerErrorKind::InterpretationFailed),
        ActionFailure::Archive(error) => fail(
            ctx,
            MachineFault::Hardware {
                code: None,
                message: error.to_string(),
            },
        ),
    }
}

fn connected(ctx: &mut Context, client: precinct_hardware::SharedScannerClient) -> Handled {
    ctx.client = Some(client);
    Go(State::CheckingInitialPaperStatus)
}

fn connect_failed(ctx: &mut Context, failure: &ActionFailure) -> Handled {
    if failure.classify() == FailureClass::Fatal {
        ctx.error = Some(ScannerErrorKind::UnexpectedConnectFailure.into());
        Go(State::UnrecoverableError)
    } else {
        Go(State::Disconnected(ReconnectPhase::WaitingToRetry))
    }
}

fn dispatch(state: &State, ctx: &mut Context, event: Event, policy: &Policy) -> Handled {
    use ScannerEvent as S;

    match (*state, event) {
        (State::UnrecoverableError, _) => Stay,

        // Connection
        (
            State::Connecting | State::Disconnected(ReconnectPhase::Reconnecting),
            Event::Action(outcome),
        ) => match outcome {
            Outcome::Connected(client) => connected(ctx, client),
            Outcome::Failed(failure) => connect_failed(ctx, &failure),
            other => Unhandled(Event::Action(other)),
        },
        (State::Disconnected(ReconnectPhase::WaitingToRetry), Event::Timer(Timer::Reconnect)) => {
            Go(State::Disconnected(ReconnectPhase::Reconnecting))
        }

        // Idle
        (State::CheckingInitialPaperStatus, Event::Scanner(event)) => match event {
            S::NoPaper => Go(State::NoPaper),
            S::ReadyToScan => {
                ctx.error = Some(ScannerErrorKind::PaperInFrontAfterReconnect.into());
                Go(State::Rejected)
            }
            S::ReadyToEject => {
                ctx.error = Some(ScannerErrorKind::PaperInBackAfterReconnect.into());
                Go(State::Rejecting(RejectingPhase::Starting))
            }
            S::BothSidesHavePaper => {
                ctx.error = Some(ScannerErrorKind::PaperInBothSidesAfterReconnect.into());
                Go(State::Rejecting(RejectingPhase::Starting))
            }
            other => Unhandled(Event::Scanner(other)),
        },
        (State::CheckingPaperStatusAfterScan, Event::Scanner(event)) => match event {
            S::NoPaper => Go(State::NoPaper),
            S::ReadyToScan => Go(State::ReadyToScan(ReadyToScanPhase::CheckingAppReady)),
            S::ReadyToEject | S::BothSidesHavePaper => {
                Go(State::ReturningToRescan(RejectingPhase::Starting))
            }
            other => Unhandled(Event::Scanner(other)),
        },
        (State::NoPaper, Event::Command(Command::BeginCalibration(kind))) => Go(match kind {
            Calibration::DoubleFeedDetection => {
                State::CalibratingDoubleFeedDetection(DoubleFeedCalibrationPhase::DoubleSheet)
            }
            Calibration::ImageSensors => {
                State::CalibratingImageSensors(ImageSensorCalibrationPhase::Calibrating)
            }
        }),
        (State::NoPaper, Event::Scanner(event)) => match event {
            S::NoPaper => Stay,
            S::ReadyToScan => Go(State::ReadyToScan(ReadyToScanPhase::CheckingAppReady)),
            S::BothSidesHavePaper => Go(State::Jam(JamPhase::RejectingPaper)),
            other => Unhandled(Event::Scanner(other)),
        },
        (State::ReadyToScan(phase), event) => match (phase, event) {
            (_, Event::Command(Command::Scan)) => Go(State::Scanning(ScanningPhase::Starting)),
            (_, Event::Scanner(S::NoPaper)) => Go(State::NoPaper),
            (_, Event::Scanner(S::ReadyToScan)) => Stay,
            (ReadyToScanPhase::CheckingAppReady, Event::Action(Outcome::ScanGate(true))) => {
                Go(State::Scanning(ScanningPhase::Starting))
            }
            (ReadyToScanPhase::CheckingAppReady, Event::Action(Outcome::ScanGate(false))) => {
                Go(State::ReadyToScan(ReadyToScanPhase::WaitingForApp))
            }
            (ReadyToScanPhase::WaitingForApp, Event::Timer(Timer::AppReadyToScan)) => {
                Go(State::ReadyToScan(ReadyToScanPhase::CheckingAppReady))
            }
            (_, event) => Unhandled(event),
        },

        // Scan pipeline
        (State::Scanning(ScanningPhase::Starting), Event::Action(outcome)) => match outcome {
            Outcome::Scanned(sheet) => {
                ctx.scanned_sheet = Some(sheet);
                Go(State::Scanning(ScanningPhase::CheckingCompleted))
            }
            Outcome::Failed(failure) => match failure.code() {
                Some(ErrorCode::NoDocumentToBeScanned) => {
                    ctx.error = Some(ScannerErrorKind::ScanningFailed.into());
                    Go(State::Rejected)
                }
                Some(code) if code.is_paper_jam() => {
                    Go(State::Scanning(ScanningPhase::HandlingJam))
                }
                _ => fail_with(ctx, &failure),
            },
            other => Unhandled(Event::Action(other)),
        },
        (State::Scanning(ScanningPhase::Starting), Event::Timer(Timer::ScanningTimeout)) => {
            fail(ctx, ScannerErrorKind::ScanningTimedOut)
        }
        (State::Scanning(ScanningPhase::CheckingCompleted), Event::Scanner(S::ReadyToEject)) => {
            Go(State::Interpreting(InterpretingPhase::Starting))
        }
        (State::Scanning(ScanningPhase::HandlingJam), Event::Timer(Timer::JamWhenScanning)) => {
            Go(State::Scanning(ScanningPhase::RoutingJam))
        }
        (State::Scanning(ScanningPhase::RoutingJam), Event::Scanner(event)) => match event {
            S::Jam => Go(State::InternalJam),
            S::JamDoubleSheet => Go(State::DoubleSheet),
            other => Unhandled(Event::Scanner(other)),
        },
        (State::Interpreting(InterpretingPhase::Starting), Event::Action(outcome)) => {
            match outcome {
                Outcome::Interpreted(interpretation) => {
                    ctx.interpretation = Some(interpretation);
                    Go(State::Interpreting(InterpretingPhase::RoutingResult))
                }
                Outcome::Failed(failure) => {
                    warn!("Interpretation failed: {}", failure);
                    ctx.error = Some(ScannerErrorKind::InterpretationFailed.into());
                    if ctx.failed_scan_attempts < policy.max_failed_scan_attempts {
                        ctx.failed_scan_attempts += 1;
                        Go(State::ReturningToRescan(RejectingPhase::Starting))
                    } else {
                        ctx.failed_scan_attempts = 0;
                        Go(State::Rejecting(RejectingPhase::Starting))
                    }
                }
                other => Unhandled(Event::Action(other)),
            }
        }

        // Disposition
        (State::ReadyToAccept, Event::Command(Command::Accept)) => {
            if policy.shoeshine_mode {
                Go(State::Accepted(AcceptedPhase::ScanningPaused))
            } else {
                Go(State::Accepting(AcceptingPhase::Starting))
            }
        }
        (State::ReadyToAccept | State::NeedsReview, Event::Scanner(S::ReadyToEject)) => Stay,
        (State::NeedsReview, Event::Command(Command::Accept)) => {
            Go(State::AcceptingAfterReview(AcceptingPhase::Starting))
        }
        (State::NeedsReview, Event::Command(Command::Return)) => {
            Go(State::Returning(RejectingPhase::Starting))
        }
        (State::Accepting(phase), event) => accepting(ctx, phase, event, State::Accepting),
        (State::AcceptingAfterReview(phase), event) => {
            accepting(ctx, phase, event, State::AcceptingAfterReview)
        }
        (State::Accepted(_), Event::Scanner(event)) => match event {
            S::Disconnected => Unhandled(Event::Scanner(event)),
            S::NoPaper
            | S::ReadyToScan
            | S::ReadyToEject
            | S::BothSidesHavePaper
            | S::Jam
            | S::JamDoubleSheet
            | S::JamCleared => Stay,
        },
        (State::Accepted(_), Event::Timer(Timer::AcceptedReadyForNextBallot)) => {
            Go(State::CheckingPaperStatusAfterScan)
        }
        (State::Rejecting(phase), event) => {
            rejecting(ctx, phase, event, State::Rejecting, State::Rejected)
        }
        (State::Returning(phase), event) => {
            rejecting(ctx, phase, event, State::Returning, State::Returned)
        }
        (State::ReturningToRescan(phase), event) => {
            rejecting(ctx, phase, event, State::ReturningToRescan, State::NoPaper)
        }
        (State::Rejected | State::Returned, Event::Scanner(event)) => match event {
            S::ReadyToScan => Stay,
            S::NoPaper => Go(State::NoPaper),
            other => Unhandled(Event::Scanner(other)),
        },

        // Faults
        (
            State::Jam(JamPhase::RejectingPaper),
            Event::Action(Outcome::Done | Outcome::Failed(_)),
        ) => Go(State::Jam(JamPhase::CheckingComplete)),
        (State::Jam(JamPhase::CheckingComplete), event) => match event {
            Event::Scanner(S::NoPaper) => Go(State::NoPaper),
            Event::Scanner(S::ReadyToScan) => {
                Go(State::ReadyToScan(ReadyToScanPhase::CheckingAppReady))
            }
            Event::Scanner(S::BothSidesHavePaper | S::Jam) => Stay,
            Event::Timer(Timer::WaitForJamCleared) => Go(State::InternalJam),
            other => Unhandled(other),
        },
        (State::InternalJam, Event::Scanner(event)) => match event {
            S::NoPaper => Go(State::NoPaper),
            S::JamDoubleSheet => Go(State::DoubleSheet),
            S::JamCleared => Go(State::JamCleared(RecoveryPhase::Resetting)),
            S::Jam | S::ReadyToScan | S::ReadyToEject => Stay,
            other => Unhandled(Event::Scanner(other)),
        },
        (State::DoubleSheet, Event::Scanner(event)) => match event {
            S::NoPaper => Go(State::NoPaper),
            S::JamCleared => Go(State::DoubleSheetJamCleared(RecoveryPhase::Resetting)),
            S::Disconnected => Unhandled(Event::Scanner(S::Disconnected)),
            _ => Stay,
        },
        (State::JamCleared(phase), event) => jam_recovery(ctx, phase, event, State::JamCleared),
        (State::DoubleSheetJamCleared(phase), event) => {
            jam_recovery(ctx, phase, event, State::DoubleSheetJamCleared)
        }
        (State::BothSidesHavePaper, Event::Scanner(event)) => match event {
            S::BothSidesHavePaper | S::NoPaper => Stay,
            S::ReadyToEject => {
                if ctx.interpretation.is_some() {
                    Go(State::Interpreting(InterpretingPhase::RoutingResult))
                } else if ctx.scanned_sheet.is_some() {
                    Go(State::Interpreting(InterpretingPhase::Starting))
                } else {
                    ctx.error = Some(ScannerErrorKind::BothSidesHavePaper.into());
                    Go(State::Rejecting(RejectingPhase::Starting))
                }
            }
            other => Unhandled(Event::Scanner(other)),
        },
        (State::Error(phase), event) => recovering(ctx, phase, event),

        // Calibration
        (State::CalibratingDoubleFeedDetection(phase), event) => {
            calibrating_double_feed(ctx, phase, event)
        }
        (State::CalibratingImageSensors(phase), event) => {
            calibrating_image_sensors(ctx, phase, event)
        }

        (_, event) => Unhandled(event),
    }
}

fn timed_out(failure: &ActionFailure) -> bool {
    matches!(failure, ActionFailure::Hardware(HardwareError::Timeout { .. }))
}

fn calibrating_double_feed(
    ctx: &mut Context,
    phase: DoubleFeedCalibrationPhase,
    event: Event,
) -> Handled {
    use DoubleFeedCalibrationPhase as P;
    let region = State::CalibratingDoubleFeedDetection;

    match (phase, event) {
        (P::DoubleSheet, Event::Action(Outcome::Done)) => Go(region(P::SingleSheet)),
        (P::SingleSheet, Event::Action(Outcome::Done)) => Go(region(P::Done)),
        (P::DoubleSheet | P::SingleSheet, Event::Timer(Timer::DoubleFeedCalibrationTimeout)) => {
            ctx.error = Some(ScannerErrorKind::DoubleFeedCalibrationTimedOut.into());
            Go(region(P::Done))
        }
        (P::DoubleSheet | P::SingleSheet, Event::Action(Outcome::Failed(failure))) => {
            if timed_out(&failure) {
                ctx.error = Some(ScannerErrorKind::DoubleFeedCalibrationTimedOut.into());
                Go(region(P::Done))
            } else {
                fail_with(ctx, &failure)
            }
        }
        (P::Done, Event::Command(Command::EndCalibration(Calibration::DoubleFeedDetection))) => {
            Go(region(P::Ending))
        }
        (P::Done, event) => calibration_done(event),
        (P::Ending, event) => calibration_ending(event),
        (_, event) => Unhandled(event),
    }
}

fn calibrating_image_sensors(
    ctx: &mut Context,
    phase: ImageSensorCalibrationPhase,
    event: Event,
) -> Handled {
    use ImageSensorCalibrationPhase as P;
    let region = State::CalibratingImageSensors;

    match (phase, event) {
        (P::Calibrating, Event::Action(Outcome::Done)) => Go(region(P::Done)),
        (P::Calibrating, Event::Timer(Timer::ImageSensorCalibrationTimeout)) => {
            ctx.error = Some(ScannerErrorKind::ImageSensorCalibrationTimedOut.into());
            Go(region(P::Done))
        }
        (P::Calibrating, Event::Action(Outcome::Failed(failure))) => {
            if timed_out(&failure) {
                ctx.error = Some(ScannerErrorKind::ImageSensorCalibrationTimedOut.into());
                Go(region(P::Done))
            } else if let ActionFailure::Hardware(HardwareError::Device { code }) = &failure
                && !code.is_connectivity()
            {
                warn!("Image sensor calibration failed: {}", code);
                ctx.error = Some(ScannerErrorKind::ImageSensorCalibrationFailed.into());
                Go(region(P::Done))
            } else {
                fail_with(ctx, &failure)
            }
        }
        (P::Done, Event::Command(Command::EndCalibration(Calibration::ImageSensors))) => {
            Go(region(P::Ending))
        }
        (P::Done, event) => calibration_done(event),
        (P::Ending, event) => calibration_ending(event),
        (_, event) => Unhandled(event),
    }
}

/// Finished calibration waits for the operator; paper is not acted on.
fn calibration_done(event: Event) -> Handled {
    use ScannerEvent as S;

    match event {
        Event::Scanner(S::Disconnected) => Unhandled(event),
        Event::Scanner(_) => Stay,
        event => Unhandled(event),
    }
}

/// Back to service. A calibration sheet left in the scanner is handed back,
/// never scanned as a ballot.
fn calibration_ending(event: Event) -> Handled {
    use ScannerEvent as S;

    match event {
        Event::Scanner(S::NoPaper) => Go(State::NoPaper),
        Event::Scanner(S::ReadyToScan) => Go(State::Returned),
        Event::Scanner(S::ReadyToEject | S::BothSidesHavePaper) => {
            Go(State::Returning(RejectingPhase::Starting))
        }
        event => Unhandled(event),
    }
}

fn accepting(
    ctx: &mut Context,
    phase: AcceptingPhase,
    event: Event,
    region: fn(AcceptingPhase) -> State,
) -> Handled {
    use ScannerEvent as S;

    match (phase, event) {
        (AcceptingPhase::Starting, Event::Action(Outcome::Done)) => {
            Go(region(AcceptingPhase::CheckingCompleted))
        }
        (AcceptingPhase::Starting, Event::Action(Outcome::Failed(failure))) => {
            fail_with(ctx, &failure)
        }
        (AcceptingPhase::CheckingCompleted, Event::Scanner(event)) => match event {
            S::NoPaper => Go(region(AcceptingPhase::FinishingAccept)),
            S::ReadyToScan | S::BothSidesHavePaper => {
                Go(region(AcceptingPhase::StoppingForReinsert))
            }
            S::ReadyToEject => Stay,
            other => Unhandled(Event::Scanner(other)),
        },
        (AcceptingPhase::CheckingCompleted, Event::Timer(Timer::AcceptingTimeout)) => {
            ctx.error = Some(ScannerErrorKind::PaperInBackAfterAccept.into());
            Go(State::Rejecting(RejectingPhase::Starting))
        }
        (AcceptingPhase::FinishingAccept, Event::Action(Outcome::Done | Outcome::Failed(_))) => {
            Go(State::Accepted(AcceptedPhase::ScanningPaused))
        }
        (AcceptingPhase::StoppingForReinsert, Event::Action(Outcome::Done)) => {
            Go(State::Accepted(AcceptedPhase::ScanningPaused))
        }
        (AcceptingPhase::StoppingForReinsert, Event::Action(Outcome::Failed(failure))) => {
            fail_with(ctx, &failure)
        }
        (_, event) => Unhandled(event),
    }
}

fn rejecting(
    ctx: &mut Context,
    phase: RejectingPhase,
    event: Event,
    region: fn(RejectingPhase) -> State,
    held: State,
) -> Handled {
    use ScannerEvent as S;

    match (phase, event) {
        (RejectingPhase::Starting, Event::Action(Outcome::Done)) => {
            Go(region(RejectingPhase::CheckingCompleted))
        }
        (RejectingPhase::Starting, Event::Action(Outcome::Failed(failure))) => {
            fail_with(ctx, &failure)
        }
        (RejectingPhase::CheckingCompleted, Event::Scanner(event)) => match event {
            S::ReadyToScan => Go(held),
            S::NoPaper => Go(State::NoPaper),
            S::ReadyToEject | S::BothSidesHavePaper => Stay,
            other => Unhandled(Event::Scanner(other)),
        },
        (RejectingPhase::CheckingCompleted, Event::Timer(Timer::WaitForHoldAfterReject)) => {
            Go(State::Jam(JamPhase::RejectingPaper))
        }
        (_, event) => Unhandled(event),
    }
}

fn jam_recovery(
    ctx: &mut Context,
    phase: RecoveryPhase,
    event: Event,
    region: fn(RecoveryPhase) -> State,
) -> Handled {
    match (phase, event) {
        (RecoveryPhase::Resetting, Event::Action(Outcome::Done | Outcome::Failed(_))) => {
            Go(region(RecoveryPhase::WaitingToReconnect))
        }
        (RecoveryPhase::WaitingToReconnect, Event::Timer(Timer::Reconnect)) => {
            Go(region(RecoveryPhase::Reconnecting))
        }
        (RecoveryPhase::Reconnecting, Event::Action(Outcome::Connected(client))) => {
            connected(ctx, client)
        }
        (RecoveryPhase::Reconnecting, Event::Action(Outcome::Failed(_))) => {
            Go(region(RecoveryPhase::WaitingToReconnect))
        }
        (_, event) => Unhandled(event),
    }
}

fn recovering(ctx: &mut Context, phase: ErrorPhase, event: Event) -> Handled {
    match (phase, event) {
        (ErrorPhase::Disconnecting, Event::Action(Outcome::Done)) => {
            ctx.client = None;
            Go(State::Error(ErrorPhase::CoolingOff))
        }
        (ErrorPhase::Disconnecting, Event::Action(Outcome::Failed(_))) => {
            ctx.client = None;
            Go(State::Error(ErrorPhase::UnexpectedError))
        }
        (
            ErrorPhase::Disconnecting | ErrorPhase::UnexpectedError,
            Event::Timer(Timer::RecoveryStep),
        ) => Go(State::Disconnected(ReconnectPhase::WaitingToRetry)),
        (ErrorPhase::CoolingOff, Event::Timer(Timer::RecoveryStep)) => {
            Go(State::Error(ErrorPhase::Reconnecting))
        }
        (ErrorPhase::Reconnecting, Event::Action(Outcome::Connected(client))) => {
            connected(ctx, client)
        }
        (ErrorPhase::Reconnecting, Event::Action(Outcome::Failed(_))) => {
            Go(State::Error(ErrorPhase::UnexpectedError))
        }
        (_, event) => Unhandled(event),
    }
}

/// Handlers shared by every state that does not claim the event itself.
fn global(ctx: &mut Context, event: Event) -> Option<State> {
    use ScannerEvent as S;

    let handled = match event {
        Event::Scanner(S::Disconnected) => Go(State::Disconnected(ReconnectPhase::WaitingToRetry)),
        Event::Scanner(S::BothSidesHavePaper) => Go(State::BothSidesHavePaper),
        Event::Scanner(S::JamDoubleSheet) => Go(State::DoubleSheet),
        Event::Scanner(S::Jam) => Go(State::InternalJam),
        Event::Scanner(S::JamCleared) => Go(State::JamCleared(RecoveryPhase::Resetting)),
        Event::Command(_) => Stay,
        Event::StatusFailed(kind) => fail(ctx, kind),
        event => {
            warn!("Unexpected event: {}", event);
            fail(ctx, ScannerErrorKind::UnexpectedEvent)
        }
    };

    match handled {
        Go(state) => Some(state),
        Stay | Unhandled(_) => None,
    }
}

/// Enter `to`, run its entry actions and resolve transient states.
fn enter(from: &State, mut to: State, ctx: &mut Context, effects: &mut Vec<Effect>) -> State {
    loop {
        on_entry(from, &to, ctx, effects);
        if !to.is_transient() {
            return to;
        }
        to = route_interpretation(ctx);
    }
}

fn route_interpretation(ctx: &mut Context) -> State {
    match &ctx.interpretation {
        Some(Interpretation::ValidSheet { .. }) => State::ReadyToAccept,
        Some(Interpretation::InvalidSheet { .. }) => State::Rejecting(RejectingPhase::Starting),
        Some(Interpretation::NeedsReviewSheet { .. }) => State::NeedsReview,
        None => {
            ctx.error = Some(ScannerErrorKind::UnexpectedEvent.into());
            State::Error(ErrorPhase::Disconnecting)
        }
    }
}

fn on_entry(from: &State, to: &State, ctx: &mut Context, effects: &mut Vec<Effect>) {
    match to {
        State::NoPaper | State::ReadyToScan(_) => ctx.clear_sheet(),
        State::Disconnected(ReconnectPhase::WaitingToRetry) => {
            ctx.client = None;
            ctx.clear_sheet();
        }
        State::Accepting(AcceptingPhase::Starting)
        | State::AcceptingAfterReview(AcceptingPhase::Starting) => ctx.failed_scan_attempts = 0,
        State::Accepted(_) => {
            let adjudicated = matches!(from, State::AcceptingAfterReview(_));
            record_accepted(ctx, adjudicated, effects);
        }
        State::Rejecting(RejectingPhase::Starting)
        | State::Returning(RejectingPhase::Starting)
        | State::ReturningToRescan(RejectingPhase::Starting)
        | State::InternalJam
        | State::DoubleSheet => record_rejected(ctx, effects),
        State::Jam(JamPhase::RejectingPaper) => {
            record_rejected(ctx, effects);
            ctx.scanned_sheet = None;
            ctx.interpretation = None;
        }
        State::JamCleared(RecoveryPhase::Resetting)
        | State::DoubleSheetJamCleared(RecoveryPhase::Resetting) => ctx.clear_sheet(),
        State::CalibratingDoubleFeedDetection(DoubleFeedCalibrationPhase::DoubleSheet)
        | State::CalibratingImageSensors(ImageSensorCalibrationPhase::Calibrating)
        | State::CalibratingDoubleFeedDetection(DoubleFeedCalibrationPhase::Ending)
        | State::CalibratingImageSensors(ImageSensorCalibrationPhase::Ending) => ctx.error = None,
        _ => {}
    }
}

fn record_accepted(ctx: &mut Context, adjudicated: bool, effects: &mut Vec<Effect>) {
    if ctx.is_recorded() {
        return;
    }
    if let Some((sheet_id, pages)) = ctx.sheet_pages() {
        ctx.recorded_sheet = Some(sheet_id);
        ctx.ballots_counted += 1;
        effects.push(Effect::RecordAccepted {
            sheet_id,
            pages,
            adjudicated,
        });
    }
}

fn record_rejected(ctx: &mut Context, effects: &mut Vec<Effect>) {
    if ctx.is_recorded() {
        return;
    }
    if let Some((sheet_id, pages)) = ctx.sheet_pages() {
        ctx.recorded_sheet = Some(sheet_id);
        effects.push(Effect::RecordRejected { sheet_id, pages });
    }
}
