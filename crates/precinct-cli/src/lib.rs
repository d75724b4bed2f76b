//! Subcommand handlers for the `precinct-scan` binary.

pub mod calibrate;
pub mod device;
pub mod simulate;
