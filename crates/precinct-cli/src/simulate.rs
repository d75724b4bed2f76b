//! Simulated voting session.
//!
//! Starts the controller against a mock scanner and plays a voter for each
//! ballot: insert the sheet, then accept, return or collect it depending on
//! what the controller decides.

use crate::device::Variant;
use anyhow::{Context as _, Result, bail};
use clap::Parser;
use precinct_core::{
    ElectionConfig, Interpretation, InvalidSheetReason, PageInterpretation, PrecinctSelection,
    ReviewReason,
};
use precinct_hardware::mock::MockScannerHandle;
use precinct_machine::{
    Delays, ImageArchive, InterpretError, Interpreter, MachineConfig, PrecinctScanner,
    PrecinctScannerStatus, PublicState, ScannedSheet,
};
use precinct_store::{Database, DatabaseConfig, MemorySheetStore, SheetStore, SqliteSheetStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// Longest time to wait for the controller to settle on a ballot.
const SETTLE_LIMIT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Scanner variant to simulate
    #[arg(long, value_enum, default_value_t)]
    pub variant: Variant,

    /// Number of ballots to feed
    #[arg(long, default_value_t = 5)]
    pub ballots: u32,

    /// SQLite database to record sheets in (in-memory store if omitted)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Directory to write scanned images to (kept in memory if omitted)
    #[arg(long)]
    pub image_dir: Option<PathBuf>,

    /// Flag every Nth ballot for review (0 disables)
    #[arg(long, default_value_t = 0)]
    pub review_every: u64,

    /// Interpret every Nth ballot as invalid (0 disables)
    #[arg(long, default_value_t = 0)]
    pub invalid_every: u64,

    /// Accept ballots flagged for review instead of returning them
    #[arg(long)]
    pub accept_reviewed: bool,

    /// Divide every controller delay by this factor
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub speedup: u32,
}

impl Default for SimulateArgs {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            ballots: 5,
            db: None,
            image_dir: None,
            review_every: 0,
            invalid_every: 0,
            accept_reviewed: false,
            speedup: 1,
        }
    }
}

/// What happened during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub variant: Variant,
    pub inserted: u32,
    pub accepted: u32,
    pub adjudicated: u32,
    pub returned: u32,
    pub rejected: u32,
    pub final_status: PrecinctScannerStatus,
}

/// Interpreter that marks every sheet valid unless told otherwise by its
/// position in the session.
#[derive(Debug)]
pub struct SessionInterpreter {
    review_every: u64,
    invalid_every: u64,
    sheets: AtomicU64,
}

impl SessionInterpreter {
    pub fn new(review_every: u64, invalid_every: u64) -> Self {
        Self {
            review_every,
            invalid_every,
            sheets: AtomicU64::new(0),
        }
    }
}

fn nth(n: u64, every: u64) -> bool {
    every != 0 && n % every == 0
}

impl Interpreter for SessionInterpreter {
    async fn interpret(
        &self,
        sheet: &ScannedSheet,
        _config: &ElectionConfig,
    ) -> Result<Interpretation, InterpretError> {
        let n = self.sheets.fetch_add(1, Ordering::SeqCst) + 1;
        let sheet_id = sheet.sheet_id;
        let pages = [
            PageInterpretation {
                page_number: 1,
                ..Default::default()
            },
            PageInterpretation {
                page_number: 2,
                ..Default::default()
            },
        ];

        Ok(if nth(n, self.invalid_every) {
            Interpretation::InvalidSheet {
                sheet_id,
                reason: InvalidSheetReason::UnreadableBallot,
                pages,
            }
        } else if nth(n, self.review_every) {
            Interpretation::NeedsReviewSheet {
                sheet_id,
                reasons: vec![ReviewReason::BlankBallot],
                pages,
            }
        } else {
            Interpretation::ValidSheet { sheet_id, pages }
        })
    }
}

pub fn demo_election() -> ElectionConfig {
    ElectionConfig {
        election_hash: "demo".to_string(),
        title: "Simulated Election".to_string(),
        precinct_selection: PrecinctSelection::AllPrecincts,
        is_test_mode: true,
    }
}

fn scaled(delays: Delays, factor: u32) -> Delays {
    Delays {
        paper_status_polling_interval: delays.paper_status_polling_interval / factor,
        paper_status_polling_interval_during_accept: delays
            .paper_status_polling_interval_during_accept
            / factor,
        paper_status_polling_timeout: delays.paper_status_polling_timeout / factor,
        scanning_timeout: delays.scanning_timeout / factor,
        jam_when_scanning: delays.jam_when_scanning / factor,
        app_ready_to_scan_polling_interval: delays.app_ready_to_scan_polling_interval / factor,
        accepting_timeout: delays.accepting_timeout / factor,
        accepted_ready_for_next_ballot: delays.accepted_ready_for_next_ballot / factor,
        wait_for_hold_after_reject: delays.wait_for_hold_after_reject / factor,
        reconnect: delays.reconnect / factor,
        reconnect_on_unexpected_error: delays.reconnect_on_unexpected_error / factor,
        wait_for_jam_cleared: delays.wait_for_jam_cleared / factor,
        double_feed_calibration_timeout: delays.double_feed_calibration_timeout / factor,
        image_sensor_calibration_timeout: delays.image_sensor_calibration_timeout / factor,
    }
}

/// Run a session with the store selected by `args`.
pub async fn run(args: SimulateArgs) -> Result<SessionReport> {
    match &args.db {
        Some(path) => {
            let db = Database::new(DatabaseConfig::new(path))
                .await
                .with_context(|| format!("opening database {}", path.display()))?;
            let store = SqliteSheetStore::new(db);
            store.set_election_config(Some(&demo_election())).await?;
            session(args, store).await
        }
        None => session(args, MemorySheetStore::with_election(demo_election())).await,
    }
}

/// Feed `args.ballots` sheets through a controller backed by `store`.
pub async fn session<S: SheetStore>(args: SimulateArgs, store: S) -> Result<SessionReport> {
    let mut config = MachineConfig::default().delays(scaled(Delays::default(), args.speedup));
    if let Some(dir) = &args.image_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating image directory {}", dir.display()))?;
        config = config.image_archive(ImageArchive::directory(dir));
    }

    let (connector, device) = args.variant.connector();
    let interpreter = SessionInterpreter::new(args.review_every, args.invalid_every);
    let scanner = PrecinctScanner::builder(connector, interpreter, store)
        .config(config)
        .start();
    let mut changes = scanner.changes();
    info!(
        "Simulating {} ballots on a {:?} scanner (ultrasonic: {})",
        args.ballots,
        args.variant,
        scanner.supports_ultrasonic()
    );

    settle(&mut changes, &[PublicState::NoPaper]).await?;

    let mut report = SessionReport {
        variant: args.variant,
        inserted: 0,
        accepted: 0,
        adjudicated: 0,
        returned: 0,
        rejected: 0,
        final_status: scanner.status(),
    };

    for ballot in 1..=args.ballots {
        device.insert_sheet();
        report.inserted += 1;

        let decided = settle(
            &mut changes,
            &[PublicState::ReadyToAccept, PublicState::NeedsReview, PublicState::Rejected],
        )
        .await?;
        info!("Ballot {}: {:?}", ballot, decided.state);

        match decided.state {
            PublicState::ReadyToAccept => {
                scanner.accept()?;
                report.accepted += 1;
            }
            PublicState::NeedsReview if args.accept_reviewed => {
                scanner.accept()?;
                report.adjudicated += 1;
            }
            PublicState::NeedsReview => {
                scanner.return_ballot()?;
                settle(&mut changes, &[PublicState::Returned]).await?;
                collect(&device);
                report.returned += 1;
            }
            _ => {
                if let Some(error) = decided.error {
                    warn!("Ballot {} rejected: {}", ballot, error);
                }
                collect(&device);
                report.rejected += 1;
            }
        }

        settle(&mut changes, &[PublicState::NoPaper]).await?;
    }

    report.final_status = scanner.status();
    scanner.shutdown().await?;
    Ok(report)
}

/// The voter takes their sheet back.
fn collect(device: &MockScannerHandle) {
    device.remove_paper();
}

/// Wait for the controller to report one of `states`.
pub(crate) async fn settle(
    changes: &mut broadcast::Receiver<PrecinctScannerStatus>,
    states: &[PublicState],
) -> Result<PrecinctScannerStatus> {
    let wait = async {
        loop {
            match changes.recv().await {
                Ok(status) if states.contains(&status.state) => return Ok(status),
                Ok(status) if status.state == PublicState::UnrecoverableError => {
                    bail!("scanner entered an unrecoverable error")
                }
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => bail!("controller stopped"),
            }
        }
    };

    tokio::time::timeout(SETTLE_LIMIT, wait)
        .await
        .with_context(|| format!("timed out waiting for {states:?}"))?
}
