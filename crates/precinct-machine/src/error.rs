//! Error types for the scanner controller.

use precinct_core::ScannerErrorKind;
use precinct_hardware::{ErrorCode, HardwareError};
use precinct_store::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the controller's public API.
#[derive(Debug, Error)]
pub enum MachineError {
    /// The controller task is no longer running
    #[error("Scanner controller stopped")]
    Stopped,

    /// The connected scanner model cannot do this
    #[error("Not supported by this scanner: {0}")]
    Unsupported(&'static str),

    /// The controller task panicked
    #[error("Scanner controller task failed: {0}")]
    Task(String),

    #[error("Image archive error: {0}")]
    Archive(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}

pub type Result<T> = std::result::Result<T, MachineError>;

/// Error returned by an [`Interpreter`](crate::gateway::Interpreter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Interpretation failed: {message}")]
pub struct InterpretError {
    pub message: String,
}

impl InterpretError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The error recorded in the controller context.
///
/// Only its [`code`](Self::code) ever leaves the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MachineFault {
    /// A controller-level fault with a stable code
    Domain(ScannerErrorKind),
    /// A raw hardware failure
    Hardware {
        code: Option<ErrorCode>,
        message: String,
    },
}

impl MachineFault {
    /// Public code: the domain code, or `client_error` for hardware failures.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(kind) => kind.code(),
            Self::Hardware { .. } => "client_error",
        }
    }
}

impl From<ScannerErrorKind> for MachineFault {
    fn from(kind: ScannerErrorKind) -> Self {
        Self::Domain(kind)
    }
}

impl From<&HardwareError> for MachineFault {
    fn from(error: &HardwareError) -> Self {
        Self::Hardware {
            code: error.code(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_fault_code() {
        let fault = MachineFault::from(ScannerErrorKind::ScanningTimedOut);
        assert_eq!(fault.code(), "scanning_timed_out");
    }

    #[test]
    fn test_hardware_fault_hides_detail() {
        let fault = MachineFault::from(&HardwareError::device(ErrorCode::ScannerError));
        assert_eq!(fault.code(), "client_error");
        assert!(matches!(
            fault,
            MachineFault::Hardware { code: Some(ErrorCode::ScannerError), .. }
        ));
    }

    #[test]
    fn test_unsupported_message() {
        let error = MachineError::Unsupported("double-feed calibration");
        assert_eq!(error.to_string(), "Not supported by this scanner: double-feed calibration");
    }

    #[test]
    fn test_interpret_error_message() {
        let error = InterpretError::new("template mismatch");
        assert_eq!(error.to_string(), "Interpretation failed: template mismatch");
    }
}
