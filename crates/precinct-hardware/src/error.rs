//! Error types for scanner hardware operations.
//!
//! Device-reported failures carry an [`ErrorCode`]; transport-level failures
//! (disconnects, timeouts, I/O) have their own variants. Every error can be
//! classified into a [`FailureClass`] so callers decide how to recover without
//! inspecting raw codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Error codes reported by the scanner firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ScannerOffline,
    OpenDeviceError,
    NoDeviceAnswer,
    DeviceAnswerUnknown,
    CommunicationUnknownError,
    NoDocumentToBeScanned,
    PaperJam,
    PaperHeldBack,
    ScannerBusy,
    CoverOpen,
    InvalidParameter,
    ScannerError,
}

impl ErrorCode {
    /// Whether the code means the device cannot be reached right now.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::ScannerOffline
                | Self::OpenDeviceError
                | Self::NoDeviceAnswer
                | Self::DeviceAnswerUnknown
        )
    }

    /// Whether the code reports paper stuck in the transport.
    #[must_use]
    pub fn is_paper_jam(&self) -> bool {
        matches!(self, Self::PaperJam | Self::PaperHeldBack)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::ScannerOffline => "scanner_offline",
            Self::OpenDeviceError => "open_device_error",
            Self::NoDeviceAnswer => "no_device_answer",
            Self::DeviceAnswerUnknown => "device_answer_unknown",
            Self::CommunicationUnknownError => "communication_unknown_error",
            Self::NoDocumentToBeScanned => "no_document_to_be_scanned",
            Self::PaperJam => "paper_jam",
            Self::PaperHeldBack => "paper_held_back",
            Self::ScannerBusy => "scanner_busy",
            Self::CoverOpen => "cover_open",
            Self::InvalidParameter => "invalid_parameter",
            Self::ScannerError => "scanner_error",
        };
        f.write_str(name)
    }
}

/// How a failed hardware call should be recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The same operation may be attempted again without touching the connection.
    RetryableNow,
    /// The connection must be torn down and re-established first.
    RetryableAfterReconnect,
    /// No automatic recovery is possible.
    Fatal,
}

/// Errors that can occur during scanner operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The firmware rejected a command with an error code.
    #[error("Device error: {code}")]
    Device { code: ErrorCode },

    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Operation is not supported by this device.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data received from device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a device error from a firmware code.
    pub fn device(code: ErrorCode) -> Self {
        Self::Device { code }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Firmware error code, if the device reported one.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Device { code } => Some(*code),
            _ => None,
        }
    }

    /// Whether the error means the device cannot be reached.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Device { code } => code.is_connectivity(),
            Self::Disconnected { .. } | Self::CommunicationError { .. } => true,
            _ => false,
        }
    }

    /// Classify the error for recovery.
    ///
    /// # Examples
    ///
    /// ```
    /// use precinct_hardware::error::{ErrorCode, FailureClass, HardwareError};
    ///
    /// let error = HardwareError::device(ErrorCode::NoDocumentToBeScanned);
    /// assert_eq!(error.classify(), FailureClass::RetryableNow);
    ///
    /// let error = HardwareError::initialization_failed("firmware mismatch");
    /// assert_eq!(error.classify(), FailureClass::Fatal);
    /// ```
    #[must_use]
    pub fn classify(&self) -> FailureClass {
        match self {
            Self::Device {
                code: ErrorCode::NoDocumentToBeScanned | ErrorCode::ScannerBusy,
            } => FailureClass::RetryableNow,
            Self::Device { .. }
            | Self::Disconnected { .. }
            | Self::Timeout { .. }
            | Self::CommunicationError { .. }
            | Self::Io(_) => FailureClass::RetryableAfterReconnect,
            Self::Unsupported { .. }
            | Self::InvalidData { .. }
            | Self::InitializationFailed { .. }
            | Self::Other(_) => FailureClass::Fatal,
        }
    }
}
