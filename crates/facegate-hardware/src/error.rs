//! Error types for hardware operations.
//!
//! Covers the serial link to the controller board and the feature-extraction
//! boundary. Link errors are contained by callers: a failed write is logged
//! and the link falls back to `Disconnected`, it never aborts the caller.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Link is not connected or the peer went away.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Serial port could not be opened.
    #[error("Failed to open {port}: {message}")]
    OpenFailed { port: String, message: String },

    /// Write or flush on an open link failed.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// The feature extractor could not process an image.
    #[error("Face extraction failed: {message}")]
    ExtractionFailed { message: String },

    /// Link configuration error.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// A reader loop is already attached to this link.
    #[error("Reader already running for {port}")]
    ReaderAlreadyRunning { port: String },

    /// Domain validation error.
    #[error(transparent)]
    Core(#[from] facegate_core::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new open failure.
    pub fn open_failed(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OpenFailed {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new extraction failure.
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

}
