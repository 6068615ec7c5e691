//! Inbound status packet schema.
//!
//! The controller emits one JSON object per line, roughly every two seconds.
//! Every key is optional; a packet carrying only `{"fan":"off"}` is valid and
//! only updates the fan. Keys outside the schema are skipped by serde's
//! default behavior, which keeps the host compatible with firmware that adds
//! fields.
//!
//! Field coercion follows what the firmware actually sends:
//!
//! | Key | Accepted | Example |
//! |-----|----------|---------|
//! | `temp`, `hum` | number or numeric string | `25.3`, `"25.3"` |
//! | `motion` | bool, integer, integer string | `1`, `true`, `"0"` |
//! | `fan`, `lights` | `"on"` / `"off"`, any case | `"ON"` |
//!
//! Anything else in a recognized key (null, objects, non-numeric text) makes
//! the whole packet malformed.

use facegate_core::constants::PACKET_START;
use facegate_core::{DeviceKind, Error, PowerState, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// One status record reported by the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPacket {
    /// Temperature in degrees Celsius, rounded to one decimal.
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub temp: Option<f64>,

    /// Relative humidity in percent, rounded to one decimal.
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub hum: Option<f64>,

    /// Motion detector output.
    #[serde(
        default,
        deserialize_with = "lenient::flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub motion: Option<bool>,

    #[serde(
        default,
        deserialize_with = "lenient::power",
        skip_serializing_if = "Option::is_none"
    )]
    pub fan: Option<PowerState>,

    #[serde(
        default,
        deserialize_with = "lenient::power",
        skip_serializing_if = "Option::is_none"
    )]
    pub lights: Option<PowerState>,
}

impl StatusPacket {
    /// Parse one packet line.
    ///
    /// # Errors
    /// Returns `Error::MalformedPacket` if the line is not a JSON object or a
    /// recognized field has an unusable value.
    ///
    /// # Examples
    ///
    /// ```
    /// use facegate_protocol::StatusPacket;
    /// use facegate_core::PowerState;
    ///
    /// let packet = StatusPacket::parse(r#"{"temp":"25.34","fan":"ON","rssi":-61}"#).unwrap();
    /// assert_eq!(packet.temp, Some(25.3));
    /// assert_eq!(packet.fan, Some(PowerState::On));
    /// assert_eq!(packet.hum, None);
    /// ```
    pub fn parse(line: &str) -> Result<Self> {
        if !line.trim_start().starts_with(PACKET_START) {
            return Err(Error::MalformedPacket(format!("not a JSON object: {line}")));
        }

        let packet: StatusPacket = serde_json::from_str(line)
            .map_err(|e| Error::MalformedPacket(format!("{e}: {line}")))?;
        Ok(packet.normalized())
    }

    /// Serialize to a single line (no terminator).
    #[must_use]
    pub fn to_line(&self) -> String {
        // A struct of options and plain enums always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Reported power state for `device`, if present in this packet.
    #[must_use]
    pub fn device_state(&self, device: DeviceKind) -> Option<PowerState> {
        match device {
            DeviceKind::Fan => self.fan,
            DeviceKind::Lights => self.lights,
        }
    }

    /// Returns `true` if the packet carries no recognized field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temp.is_none()
            && self.hum.is_none()
            && self.motion.is_none()
            && self.fan.is_none()
            && self.lights.is_none()
    }

    fn normalized(mut self) -> Self {
        self.temp = self.temp.map(round_tenth);
        self.hum = self.hum.map(round_tenth);
        self
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

mod lenient {
    use super::*;
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Number(f64),
        Text(String),
    }

    pub(super) fn number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = match Scalar::deserialize(deserializer)? {
            Scalar::Number(n) => n,
            Scalar::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("non-numeric value {s:?}")))?,
            Scalar::Bool(b) => return Err(D::Error::custom(format!("expected number, got {b}"))),
        };

        if !value.is_finite() {
            return Err(D::Error::custom("numeric value is not finite"));
        }
        Ok(Some(value))
    }

    pub(super) fn flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Scalar::deserialize(deserializer)? {
            Scalar::Bool(b) => Ok(Some(b)),
            Scalar::Number(n) if n.is_finite() => Ok(Some(n.trunc() != 0.0)),
            Scalar::Number(_) => Err(D::Error::custom("motion value is not finite")),
            Scalar::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(|n| Some(n != 0))
                .map_err(|_| D::Error::custom(format!("invalid motion value {s:?}"))),
        }
    }

    pub(super) fn power<'de, D>(
        deserializer: D,
    ) -> std::result::Result<Option<PowerState>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Scalar::deserialize(deserializer)? {
            Scalar::Text(s) => s.parse::<PowerState>().map(Some).map_err(D::Error::custom),
            _ => Err(D::Error::custom("device state must be \"on\" or \"off\"")),
        }
    }
}
