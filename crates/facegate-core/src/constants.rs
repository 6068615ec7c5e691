//! Core constants for the Facegate access controller.
//!
//! This module defines the defaults shared across the workspace: signature
//! geometry, match thresholds, serial link timing and session lifetime.
//! Every config struct in the other crates starts from these values, so a
//! deployment that needs different behavior overrides the config, not the
//! constant.
//!
//! # Usage
//!
//! ```
//! use facegate_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(DEFAULT_BAUD_RATE, 115_200);
//! assert!(DEFAULT_CENTROID_THRESHOLD < DEFAULT_SINGLE_SAMPLE_THRESHOLD);
//!
//! let backoff = Duration::from_secs(RECONNECT_INTERVAL_SECS);
//! assert_eq!(backoff.as_secs(), 3);
//! ```

// ============================================================================
// Face Signatures
// ============================================================================

/// Dimensionality produced by the default feature-extraction model.
///
/// The store does not hard-code this value: it enforces that all stored
/// samples share whatever dimension the first enrollment used.
pub const DEFAULT_SIGNATURE_DIMENSION: usize = 128;

/// Maximum accepted distance for single-sample comparisons.
///
/// The extraction model's reference cutoff. Lower is stricter.
pub const DEFAULT_SINGLE_SAMPLE_THRESHOLD: f64 = 0.6;

/// Maximum accepted distance when comparing against a multi-sample centroid.
///
/// Centroids pull outliers toward the mean, so legitimate matches land
/// closer and the cutoff is tightened accordingly.
pub const DEFAULT_CENTROID_THRESHOLD: f64 = 0.5;

// ============================================================================
// Identities
// ============================================================================

/// Maximum length of an identity identifier.
pub const MAX_IDENTITY_ID_LENGTH: usize = 64;

/// Maximum length of a display name.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 128;

// ============================================================================
// Serial Link
// ============================================================================

/// Default serial port name.
#[cfg(windows)]
pub const DEFAULT_SERIAL_PORT: &str = "COM3";

/// Default serial port name.
#[cfg(not(windows))]
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";

/// Default serial baud rate for the controller board.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Fixed backoff between reconnect attempts, in seconds.
pub const RECONNECT_INTERVAL_SECS: u64 = 3;

/// Upper bound for a single blocking line read, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1_000;

/// Maximum accepted length of one inbound line, in bytes.
///
/// Longer lines are discarded as malformed.
pub const MAX_LINE_LENGTH: usize = 4 * 1024;

// ============================================================================
// Wire Tokens
// ============================================================================

/// Outbound token instructing the controller to release the door.
pub const GRANT_TOKEN: &str = "GRANTED";

/// Separator between device and state in outbound device commands.
///
/// ```
/// use facegate_core::constants::COMMAND_SEPARATOR;
///
/// let parts: Vec<&str> = "FAN:ON".split(COMMAND_SEPARATOR).collect();
/// assert_eq!(parts, vec!["FAN", "ON"]);
/// ```
pub const COMMAND_SEPARATOR: char = ':';

/// First character of a structured status packet.
///
/// Any other leading character marks a free-form diagnostic line.
pub const PACKET_START: char = '{';

// ============================================================================
// Sessions
// ============================================================================

/// Default lifetime of an issued session credential, in hours.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
