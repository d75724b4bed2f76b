//! Precinct ballot scanner controller.
//!
//! Drives a sheet-fed scanner through the ballot cycle: wait for a sheet,
//! scan it, have it interpreted, then drop it into the ballot box or hand it
//! back to the voter, recovering from jams, double feeds and disconnects
//! along the way.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      PrecinctScanner (handle)                 │
//! │   status · subscribe · scan · accept · return · calibration   │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                │ commands
//! ┌──────────────────────────────▼────────────────────────────────┐
//! │                         Runner (one task)                     │
//! │   normalizer ──► transition::step ──► store writes ──► enter  │
//! └───────┬──────────────────┬──────────────────────┬─────────────┘
//!         │                  │                      │
//! ┌───────▼──────┐   ┌───────▼────────┐    ┌────────▼─────────┐
//! │ status       │   │ action         │    │ SheetStore       │
//! │ watcher      │   │ executors      │    │ (precinct-store) │
//! └───────┬──────┘   └───┬────────┬───┘    └──────────────────┘
//!         │              │        │
//! ┌───────▼──────────────▼──┐  ┌──▼──────────┐
//! │ ScannerClient           │  │ Interpreter │
//! │ (precinct-hardware)     │  └─────────────┘
//! └─────────────────────────┘
//! ```
//!
//! All routing lives in [`transition::step`], a pure function over
//! [`State`], [`Context`] and [`Event`]. The runner task applies it to one
//! event at a time and owns every side effect.

pub mod action;
pub mod archive;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub(crate) mod executor;
pub mod gateway;
pub mod history;
pub mod normalizer;
pub(crate) mod runner;
pub mod scanner;
pub mod state;
pub mod status;
pub mod transition;

pub use archive::ImageArchive;
pub use config::{Delays, MachineConfig};
pub use context::{Context, ImageRef, ScannedSheet};
pub use error::{InterpretError, MachineError, MachineFault, Result};
pub use event::{ActionFailure, Calibration, Command, Event, Outcome, Timer};
pub use gateway::{AutoScan, Interpreter, ManualScan, ScanGate, ScanSwitch};
pub use history::{StateTransition, TransitionHistory};
pub use normalizer::{ScannerEvent, normalize, normalize_error, normalize_status};
pub use scanner::{PrecinctScanner, PrecinctScannerBuilder};
pub use state::{PublicState, State};
pub use status::{PrecinctScannerStatus, project};
pub use transition::{Policy, Step, step};
