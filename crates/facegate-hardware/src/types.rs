//! Common types shared by the link, the mirror and the bridge.

use chrono::{DateTime, Utc};
use facegate_core::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS, DEFAULT_SERIAL_PORT, RECONNECT_INTERVAL_SECS,
};
use facegate_core::{DeviceKind, PowerState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Connection state of the transport link.
///
/// ```text
/// Disconnected ──open──► Connecting ──ok──► Connected
///      ▲                      │                 │
///      └──────── error ───────┴──── I/O error ──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Configuration for the serial transport link.
///
/// # Examples
///
/// ```
/// use facegate_hardware::LinkConfig;
/// use std::time::Duration;
///
/// let config = LinkConfig::new("/dev/ttyACM0")
///     .with_baud_rate(9_600)
///     .with_retry_interval(Duration::from_secs(1));
///
/// assert_eq!(config.port, "/dev/ttyACM0");
/// assert_eq!(config.baud_rate, 9_600);
/// assert_eq!(config.read_timeout, Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Serial port name (e.g., "/dev/ttyUSB0", "COM3").
    pub port: String,

    /// Baud rate in bits per second.
    pub baud_rate: u32,

    /// Upper bound for one blocking read.
    pub read_timeout: Duration,

    /// Fixed wait between reconnect attempts.
    pub retry_interval: Duration,
}

impl LinkConfig {
    /// Create a config for `port` with default timing.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the read timeout.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Set the reconnect backoff.
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Check that the values are usable.
    ///
    /// # Errors
    /// Returns `HardwareError::ConfigurationError` for an empty port name, a
    /// zero baud rate or a zero read timeout.
    pub fn validate(&self) -> crate::Result<()> {
        if self.port.trim().is_empty() {
            return Err(crate::HardwareError::configuration("port name is empty"));
        }
        if self.baud_rate == 0 {
            return Err(crate::HardwareError::configuration("baud rate must be non-zero"));
        }
        if self.read_timeout.is_zero() {
            return Err(crate::HardwareError::configuration(
                "read timeout must be non-zero",
            ));
        }
        Ok(())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERIAL_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            retry_interval: Duration::from_secs(RECONNECT_INTERVAL_SECS),
        }
    }
}

/// Where a mirrored device state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Startup value; nothing reported or requested yet.
    #[default]
    Assumed,

    /// Local intent applied before the controller confirmed it.
    Optimistic,

    /// Reported by the controller.
    Reported,
}

/// Point-in-time copy of one mirrored actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub device: DeviceKind,
    pub state: PowerState,
    pub provenance: Provenance,
}

/// Point-in-time copy of the mirrored sensors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// Temperature in degrees Celsius, if ever reported.
    pub temperature: Option<f64>,

    /// Relative humidity in percent, if ever reported.
    pub humidity: Option<f64>,

    pub motion: bool,

    /// Time of the last inbound packet. Local intents never touch it.
    pub last_update: Option<DateTime<Utc>>,
}
