//! Scanner calibration.
//!
//! Runs the calibration through the controller, the way a poll worker would
//! from the admin screen: begin, wait for the result, then end to return the
//! scanner to service.

use crate::device::Variant;
use crate::simulate::{SessionInterpreter, demo_election, settle};
use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use precinct_machine::{ManualScan, PrecinctScanner, PublicState};
use precinct_store::MemorySheetStore;
use tracing::info;

/// What to calibrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// Ultrasonic double-feed detector, with a double then a single sheet
    DoubleFeed,
    /// Contact image sensors
    ImageSensors,
}

#[derive(Parser, Debug, Clone)]
pub struct CalibrateArgs {
    /// Scanner variant to calibrate
    #[arg(long, value_enum, default_value_t)]
    pub variant: Variant,

    #[arg(value_enum)]
    pub target: Target,
}

pub async fn run(args: CalibrateArgs) -> Result<()> {
    let (connector, _device) = args.variant.connector();
    // Nothing is scanned while calibrating, so ballots never reach the store.
    let scanner = PrecinctScanner::builder(
        connector,
        SessionInterpreter::new(0, 0),
        MemorySheetStore::with_election(demo_election()),
    )
    .scan_gate(ManualScan)
    .start();
    let mut changes = scanner.changes();

    let outcome = async {
        settle(&mut changes, &[PublicState::NoPaper]).await?;
        info!("Calibrating {:?} on a {:?} scanner", args.target, args.variant);

        let done = match args.target {
            Target::DoubleFeed => {
                scanner.begin_double_feed_calibration()?;
                PublicState::CalibratingDoubleFeedDetectionDone
            }
            Target::ImageSensors => {
                scanner.begin_image_sensor_calibration()?;
                PublicState::CalibratingImageSensorsDone
            }
        };
        let result = settle(&mut changes, &[done]).await?;

        match args.target {
            Target::DoubleFeed => scanner.end_double_feed_calibration()?,
            Target::ImageSensors => scanner.end_image_sensor_calibration()?,
        }
        settle(&mut changes, &[PublicState::NoPaper, PublicState::Returned]).await?;
        Ok::<_, anyhow::Error>(result.error)
    }
    .await;

    scanner.shutdown().await?;
    if let Some(code) = outcome? {
        bail!("calibrating {:?} failed: {}", args.target, code);
    }

    info!("Calibration complete");
    Ok(())
}
