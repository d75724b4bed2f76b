//! Public handle to a running scanner controller.

use crate::config::MachineConfig;
use crate::context::Context;
use crate::error::{MachineError, Result};
use crate::event::{Calibration, Command};
use crate::executor::Services;
use crate::gateway::{AutoScan, Interpreter, ScanGate};
use crate::history::{StateTransition, TransitionHistory};
use crate::runner::{Envelope, EventSender, Runner};
use crate::state::State;
use crate::status::PrecinctScannerStatus;
use crate::transition::Policy;
use precinct_hardware::ScannerConnector;
use precinct_store::SheetStore;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::debug;

/// Handle to a precinct scanner controller running on its own task.
///
/// # Examples
///
/// ```no_run
/// use precinct_hardware::mock::MockConnector;
/// use precinct_machine::{InterpretError, Interpreter, PrecinctScanner, ScannedSheet};
/// use precinct_core::{ElectionConfig, Interpretation, PageInterpretation};
/// use precinct_store::MemorySheetStore;
///
/// struct AcceptEverything;
///
/// impl Interpreter for AcceptEverything {
///     async fn interpret(
///         &self,
///         sheet: &ScannedSheet,
///         _config: &ElectionConfig,
///     ) -> Result<Interpretation, InterpretError> {
///         Ok(Interpretation::ValidSheet {
///             sheet_id: sheet.sheet_id,
///             pages: [PageInterpretation::default(), PageInterpretation::default()],
///         })
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> precinct_machine::Result<()> {
///     let (connector, device) = MockConnector::polling();
///     let scanner = PrecinctScanner::builder(connector, AcceptEverything, MemorySheetStore::new())
///         .start();
///
///     device.insert_sheet();
///     let mut status = scanner.subscribe();
///     status.changed().await.ok();
///     println!("{:?}", scanner.status());
///
///     scanner.shutdown().await
/// }
/// ```
#[derive(Debug)]
pub struct PrecinctScanner {
    sender: EventSender,
    status: watch::Receiver<PrecinctScannerStatus>,
    changes: broadcast::Sender<PrecinctScannerStatus>,
    history: TransitionHistory,
    supports_ultrasonic: bool,
    task: Option<JoinHandle<()>>,
}

impl PrecinctScanner {
    /// Start building a controller. Sheets are scanned automatically
    /// unless another [`ScanGate`] is set.
    pub fn builder<C, I, S>(
        connector: C,
        interpreter: I,
        store: S,
    ) -> PrecinctScannerBuilder<C, I, S, AutoScan>
    where
        C: ScannerConnector,
        I: Interpreter,
        S: SheetStore,
    {
        PrecinctScannerBuilder {
            connector,
            interpreter,
            store,
            gate: AutoScan,
            config: MachineConfig::default(),
        }
    }

    /// Current public status.
    #[must_use]
    pub fn status(&self) -> PrecinctScannerStatus {
        self.status.borrow().clone()
    }

    /// Watch the latest status.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PrecinctScannerStatus> {
        self.status.clone()
    }

    /// Receive every status change from now on.
    #[must_use]
    pub fn changes(&self) -> broadcast::Receiver<PrecinctScannerStatus> {
        self.changes.subscribe()
    }

    fn send(&self, command: Command) -> Result<()> {
        debug!("Sending command: {}", command);
        self.sender
            .send(Envelope::Command(command))
            .map_err(|_| MachineError::Stopped)
    }

    /// Scan the sheet waiting at the front. Ignored in other states.
    pub fn scan(&self) -> Result<()> {
        self.send(Command::Scan)
    }

    /// Drop the held sheet into the ballot box. Ignored unless a sheet is
    /// ready to accept or awaiting review.
    pub fn accept(&self) -> Result<()> {
        self.send(Command::Accept)
    }

    /// Hand a sheet awaiting review back to the voter.
    pub fn return_ballot(&self) -> Result<()> {
        self.send(Command::Return)
    }

    /// Calibrate the double-feed detector: two sheets, then one.
    ///
    /// Honored only while the scanner is empty. The result is reported as
    /// `calibrating_double_feed_detection.done`, with an error code if it
    /// timed out.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::Unsupported`] on scanners without an
    /// ultrasonic detector.
    pub fn begin_double_feed_calibration(&self) -> Result<()> {
        if !self.supports_ultrasonic {
            return Err(MachineError::Unsupported("double-feed calibration"));
        }
        self.send(Command::BeginCalibration(Calibration::DoubleFeedDetection))
    }

    /// Return to service after double-feed calibration has finished.
    pub fn end_double_feed_calibration(&self) -> Result<()> {
        self.send(Command::EndCalibration(Calibration::DoubleFeedDetection))
    }

    /// Calibrate the image sensors. Honored only while the scanner is empty.
    pub fn begin_image_sensor_calibration(&self) -> Result<()> {
        self.send(Command::BeginCalibration(Calibration::ImageSensors))
    }

    pub fn end_image_sensor_calibration(&self) -> Result<()> {
        self.send(Command::EndCalibration(Calibration::ImageSensors))
    }

    /// Whether the scanner has an ultrasonic double-feed detector.
    #[must_use]
    pub fn supports_ultrasonic(&self) -> bool {
        self.supports_ultrasonic
    }

    /// Recent state transitions, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<StateTransition> {
        self.history.snapshot()
    }

    /// Stop the controller and release the scanner.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::Task`] if the controller task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        let _ = self.sender.send(Envelope::Shutdown);
        if let Some(task) = self.task.take() {
            task.await.map_err(|e| MachineError::Task(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for PrecinctScanner {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.sender.send(Envelope::Shutdown);
        }
    }
}

/// Builder for [`PrecinctScanner`].
#[derive(Debug)]
pub struct PrecinctScannerBuilder<C, I, S, G> {
    connector: C,
    interpreter: I,
    store: S,
    gate: G,
    config: MachineConfig,
}

impl<C, I, S, G> PrecinctScannerBuilder<C, I, S, G> {
    /// Set the controller configuration
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set how the controller decides to scan without a command
    pub fn scan_gate<G2: ScanGate>(self, gate: G2) -> PrecinctScannerBuilder<C, I, S, G2> {
        PrecinctScannerBuilder {
            connector: self.connector,
            interpreter: self.interpreter,
            store: self.store,
            gate,
            config: self.config,
        }
    }
}

impl<C, I, S, G> PrecinctScannerBuilder<C, I, S, G>
where
    C: ScannerConnector,
    I: Interpreter,
    S: SheetStore,
    G: ScanGate,
{
    /// Spawn the controller on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(self) -> PrecinctScanner {
        let supports_ultrasonic = self.connector.supports_ultrasonic();
        let (sender, receiver) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(PrecinctScannerStatus::initial(0));
        let (changes, _) = broadcast::channel(self.config.status_channel_capacity.max(1));
        let history = TransitionHistory::new();

        let runner = Runner {
            services: Arc::new(Services {
                connector: self.connector,
                interpreter: self.interpreter,
                store: self.store,
                gate: self.gate,
                archive: self.config.image_archive.clone(),
            }),
            policy: Policy {
                max_failed_scan_attempts: self.config.max_failed_scan_attempts,
                shoeshine_mode: false,
            },
            config: self.config,
            state: State::INITIAL,
            ctx: Context::default(),
            epoch: 0,
            activities: JoinSet::new(),
            sender: sender.clone(),
            receiver,
            status: status_tx,
            changes: changes.clone(),
            history: history.clone(),
        };
        let task = tokio::spawn(runner.run());

        PrecinctScanner {
            sender,
            status: status_rx,
            changes,
            history,
            supports_ultrasonic,
            task: Some(task),
        }
    }
}
