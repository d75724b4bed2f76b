//! Action executors.
//!
//! Each executor performs one action for the state that invoked it and
//! reports a single [`Outcome`]. Executors never touch the context; the
//! runner hands them the client and sheet they need.

use crate::action::{Action, Effect};
use crate::archive::ImageArchive;
use crate::context::ScannedSheet;
use crate::event::{ActionFailure, Outcome};
use crate::gateway::{Interpreter, ScanGate};
use precinct_core::{ScannerSettings, SheetId};
use precinct_hardware::{
    DoubleSheetDetection, FormMovement, HardwareError, ScanOptions, ScannerClient,
    ScannerConnector, SharedScannerClient,
};
use precinct_store::{SheetStore, StorageResult};
use tracing::{debug, info, warn};

/// Everything the executors call out to.
#[derive(Debug)]
pub(crate) struct Services<C, I, S, G> {
    pub connector: C,
    pub interpreter: I,
    pub store: S,
    pub gate: G,
    pub archive: ImageArchive,
}

/// Inputs captured from the context when the action starts.
#[derive(Debug, Default)]
pub(crate) struct ActionInput {
    pub client: Option<SharedScannerClient>,
    pub sheet: Option<ScannedSheet>,
}

fn require_client(input: &ActionInput) -> Result<SharedScannerClient, ActionFailure> {
    input.client.clone().ok_or_else(|| {
        ActionFailure::Hardware(HardwareError::disconnected("no scanner connection"))
    })
}

fn into_outcome(result: Result<Outcome, ActionFailure>) -> Outcome {
    result.unwrap_or_else(Outcome::Failed)
}

impl<C, I, S, G> Services<C, I, S, G>
where
    C: ScannerConnector,
    I: Interpreter,
    S: SheetStore,
    G: ScanGate,
{
    /// Run `action` to completion.
    pub(crate) async fn execute(&self, action: Action, input: ActionInput) -> Outcome {
        debug!("Executing {:?}", action);
        let result = match action {
            Action::Connect => self.connect(input).await,
            Action::Scan => self.scan(&input).await,
            Action::Interpret => self.interpret(input).await,
            Action::CheckScanGate => Ok(Outcome::ScanGate(self.gate.is_ready_to_scan().await)),
            Action::Disconnect
            | Action::Eject(_)
            | Action::Move(_)
            | Action::StopAndReload
            | Action::ResetHardware
            | Action::CalibrateDoubleFeed(_)
            | Action::CalibrateImageSensors => self.drive(action, &input).await,
        };
        into_outcome(result)
    }

    /// Commands that only drive the device and report completion.
    async fn drive(&self, action: Action, input: &ActionInput) -> Result<Outcome, ActionFailure> {
        let client = require_client(input)?;
        let mut guard = client.lock().await;
        match action {
            Action::Disconnect => guard.disconnect().await?,
            Action::Eject(motion) => guard.eject_document(motion).await?,
            Action::Move(movement) => guard.move_paper(movement).await?,
            Action::StopAndReload => {
                guard.move_paper(FormMovement::Stop).await?;
                guard.move_paper(FormMovement::LoadPaper).await?;
            }
            Action::ResetHardware => guard.reset_hardware().await?,
            Action::CalibrateDoubleFeed(kind) => {
                guard.calibrate_double_feed_detection(kind).await?;
                info!("Double-feed calibration step {:?} complete", kind);
            }
            Action::CalibrateImageSensors => {
                guard.calibrate_image_sensors().await?;
                info!("Image sensor calibration complete");
            }
            other => {
                let operation = format!("{other:?}");
                return Err(ActionFailure::Hardware(HardwareError::unsupported(operation)));
            }
        }
        Ok(Outcome::Done)
    }

    async fn connect(&self, input: ActionInput) -> Result<Outcome, ActionFailure> {
        if let Some(old) = input.client {
            // A client still busy with an abandoned command is simply dropped.
            if let Ok(mut guard) = old.try_lock() {
                if let Err(e) = guard.disconnect().await {
                    debug!("Ignoring error while releasing old client: {}", e);
                }
            }
        }

        let client = self.connector.connect().await?;
        info!("Connected to scanner");
        Ok(Outcome::Connected(client.into_shared()))
    }

    async fn scan(&self, input: &ActionInput) -> Result<Outcome, ActionFailure> {
        let client = require_client(input)?;
        let settings = self.scanner_settings().await;
        let options = ScanOptions {
            double_sheet_detection: if settings.is_double_feed_detection_disabled {
                DoubleSheetDetection::Disabled
            } else {
                DoubleSheetDetection::Enabled
            },
            ..ScanOptions::default()
        };

        let images = client.lock().await.scan(&options).await?;
        let sheet_id = SheetId::new();
        let sheet = self
            .archive
            .store(sheet_id, images)
            .await
            .map_err(ActionFailure::Archive)?;
        info!("Scanned sheet {}", sheet_id);
        Ok(Outcome::Scanned(sheet))
    }

    async fn interpret(&self, input: ActionInput) -> Result<Outcome, ActionFailure> {
        let sheet = input
            .sheet
            .ok_or_else(|| ActionFailure::Interpretation("no scanned sheet".to_string()))?;
        let config = match self.store.election_config().await {
            Ok(Some(config)) => config,
            Ok(None) => {
                return Err(ActionFailure::Interpretation("no election configured".to_string()));
            }
            Err(e) => {
                return Err(ActionFailure::Interpretation(format!(
                    "could not read election configuration: {e}"
                )));
            }
        };

        let interpretation = self
            .interpreter
            .interpret(&sheet, &config)
            .await
            .map_err(|e| ActionFailure::Interpretation(e.message))?;

        if interpretation.sheet_id() != sheet.sheet_id {
            return Err(ActionFailure::Interpretation(format!(
                "interpretation for sheet {} returned for sheet {}",
                interpretation.sheet_id(),
                sheet.sheet_id
            )));
        }
        info!("Interpreted sheet {} as {}", sheet.sheet_id, interpretation.type_name());
        Ok(Outcome::Interpreted(interpretation))
    }

    /// Current operator settings, falling back to defaults if unreadable.
    pub(crate) async fn scanner_settings(&self) -> ScannerSettings {
        match self.store.scanner_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Could not read scanner settings, using defaults: {}", e);
                ScannerSettings::default()
            }
        }
    }

    /// Write a sheet to the store.
    pub(crate) async fn record(&self, effect: &Effect) -> StorageResult<()> {
        match effect {
            Effect::RecordAccepted {
                sheet_id,
                pages,
                adjudicated,
            } => {
                let batch_id = self.store.ongoing_batch_id().await?;
                self.store.add_sheet(*sheet_id, batch_id, pages).await?;
                if *adjudicated {
                    self.store.adjudicate_sheet(*sheet_id).await?;
                }
                info!("Recorded accepted sheet {} in batch {}", sheet_id, batch_id);
            }
            Effect::RecordRejected { sheet_id, pages } => {
                let batch_id = self.store.ongoing_batch_id().await?;
                self.store.record_rejected_sheet(*sheet_id, batch_id, pages).await?;
                info!("Recorded rejected sheet {} in batch {}", sheet_id, batch_id);
            }
        }
        Ok(())
    }
}
