//! Shared helpers for controller scenario tests.

#![allow(dead_code)]

use precinct_core::{
    ElectionConfig, Interpretation, InvalidSheetReason, PageInterpretation, PrecinctSelection,
    ReviewReason, Votes,
};
use precinct_hardware::mock::{MockConnector, MockScannerHandle};
use precinct_machine::{
    AutoScan, InterpretError, Interpreter, MachineConfig, PrecinctScanner, PrecinctScannerStatus,
    PublicState, ScanGate, ScannedSheet,
};
use precinct_store::MemorySheetStore;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Upper bound on logical time a scenario waits for a status.
pub const WAIT_LIMIT: Duration = Duration::from_secs(120);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn election() -> ElectionConfig {
    ElectionConfig {
        election_hash: "0f1e2d3c".to_string(),
        title: "General Election".to_string(),
        precinct_selection: PrecinctSelection::AllPrecincts,
        is_test_mode: true,
    }
}

/// Vote content used to check that nothing leaks into the status.
pub fn marked_votes() -> Votes {
    let mut votes = Votes::new();
    votes.insert("contest-mayor".to_string(), vec!["choice-alice".to_string()]);
    votes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scripted {
    Valid,
    Invalid,
    NeedsReview,
    Fail,
}

/// Interpreter that answers from a script, then repeats a default.
#[derive(Debug, Clone)]
pub struct ScriptedInterpreter {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    fallback: Scripted,
    calls: Arc<AtomicUsize>,
}

impl ScriptedInterpreter {
    pub fn always(fallback: Scripted) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn valid() -> Self {
        Self::always(Scripted::Valid)
    }

    pub fn then(self, next: Scripted) -> Self {
        self.script.lock().unwrap().push_back(next);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Interpreter for ScriptedInterpreter {
    async fn interpret(
        &self,
        sheet: &ScannedSheet,
        _config: &ElectionConfig,
    ) -> Result<Interpretation, InterpretError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front().unwrap_or(self.fallback);

        let sheet_id = sheet.sheet_id;
        let pages = [
            PageInterpretation {
                page_number: 1,
                votes: marked_votes(),
            },
            PageInterpretation {
                page_number: 2,
                votes: Votes::new(),
            },
        ];
        match next {
            Scripted::Valid => Ok(Interpretation::ValidSheet { sheet_id, pages }),
            Scripted::Invalid => Ok(Interpretation::InvalidSheet {
                sheet_id,
                reason: InvalidSheetReason::InvalidPrecinct,
                pages,
            }),
            Scripted::NeedsReview => Ok(Interpretation::NeedsReviewSheet {
                sheet_id,
                reasons: vec![ReviewReason::Overvote { contest_id: "contest-mayor".to_string() }],
                pages,
            }),
            Scripted::Fail => Err(InterpretError::new("ballot template not found")),
        }
    }
}

/// A running controller wired to a mock scanner and an in-memory store.
pub struct Harness {
    pub scanner: PrecinctScanner,
    pub device: MockScannerHandle,
    pub store: MemorySheetStore,
    pub interpreter: ScriptedInterpreter,
    changes: broadcast::Receiver<PrecinctScannerStatus>,
}

pub struct HarnessBuilder<G> {
    connector: (MockConnector, MockScannerHandle),
    interpreter: ScriptedInterpreter,
    store: MemorySheetStore,
    config: MachineConfig,
    gate: G,
}

impl HarnessBuilder<AutoScan> {
    pub fn new() -> Self {
        init_tracing();
        Self {
            connector: MockConnector::polling(),
            interpreter: ScriptedInterpreter::valid(),
            store: MemorySheetStore::with_election(election()),
            config: MachineConfig::default(),
            gate: AutoScan,
        }
    }
}

impl<G: ScanGate> HarnessBuilder<G> {
    pub fn push(mut self) -> Self {
        self.connector = MockConnector::push();
        self
    }

    pub fn interpreter(mut self, interpreter: ScriptedInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn store(mut self, store: MemorySheetStore) -> Self {
        self.store = store;
        self
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn gate<G2: ScanGate>(self, gate: G2) -> HarnessBuilder<G2> {
        HarnessBuilder {
            connector: self.connector,
            interpreter: self.interpreter,
            store: self.store,
            config: self.config,
            gate,
        }
    }

    /// Device handle, for scripting before the controller starts.
    pub fn device(&self) -> &MockScannerHandle {
        &self.connector.1
    }

    pub fn start(self) -> Harness {
        let (connector, device) = self.connector;
        let scanner =
            PrecinctScanner::builder(connector, self.interpreter.clone(), self.store.clone())
                .config(self.config)
                .scan_gate(self.gate)
                .start();
        let changes = scanner.changes();

        Harness {
            scanner,
            device,
            store: self.store,
            interpreter: self.interpreter,
            changes,
        }
    }
}

impl Harness {
    /// Default controller, waited until idle with no paper.
    pub async fn idle() -> Self {
        let mut harness = HarnessBuilder::new().start();
        harness.wait_for(PublicState::NoPaper).await;
        harness
    }

    /// Wait for the next status in `state`.
    pub async fn wait_for(&mut self, state: PublicState) -> PrecinctScannerStatus {
        self.wait_until(|status| status.state == state).await
    }

    /// Wait for the next status matching `predicate`.
    pub async fn wait_until<F>(&mut self, mut predicate: F) -> PrecinctScannerStatus
    where
        F: FnMut(&PrecinctScannerStatus) -> bool,
    {
        let changes = &mut self.changes;
        let wait = async {
            loop {
                match changes.recv().await {
                    Ok(status) if predicate(&status) => return status,
                    Ok(_) | Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => panic!("controller stopped"),
                }
            }
        };
        match tokio::time::timeout(WAIT_LIMIT, wait).await {
            Ok(status) => status,
            Err(_) => panic!(
                "timed out waiting for status; current status is {:?}",
                self.scanner.status()
            ),
        }
    }

    /// Let logical time pass.
    pub async fn idle_for(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Insert a sheet and wait until it has been interpreted.
    pub async fn insert_and_wait(&mut self, state: PublicState) -> PrecinctScannerStatus {
        self.device.insert_sheet();
        self.wait_for(state).await
    }

    /// Accept the held sheet and wait until the scanner is empty again.
    pub async fn accept_and_clear(&mut self) -> PrecinctScannerStatus {
        self.scanner.accept().unwrap();
        let accepted = self.wait_for(PublicState::Accepted).await;
        self.wait_for(PublicState::NoPaper).await;
        accepted
    }
}
