//! Scanner selection shared by the subcommands.

use clap::ValueEnum;
use precinct_hardware::mock::{MockConnector, MockScannerHandle};
use serde::Serialize;

/// Which simulated scanner to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Scanner whose status must be polled
    #[default]
    Polling,
    /// Scanner that pushes status changes and has an ultrasonic sensor
    Push,
}

impl Variant {
    pub fn connector(self) -> (MockConnector, MockScannerHandle) {
        match self {
            Self::Polling => MockConnector::polling(),
            Self::Push => MockConnector::push(),
        }
    }
}
