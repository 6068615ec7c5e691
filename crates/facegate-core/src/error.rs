use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Signature dimension mismatch: expected {expected}, got {actual}")]
    InvalidSignature { expected: usize, actual: usize },

    // Device errors
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Invalid power state: {0}")]
    InvalidPowerState(String),

    // Wire format errors
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
