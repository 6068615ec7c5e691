//! Outbound commands sent from the host to the controller.

use facegate_core::constants::{COMMAND_SEPARATOR, GRANT_TOKEN};
use facegate_core::{DeviceKind, Error, PowerState, Result};
use std::fmt;

/// A single outbound command line.
///
/// # Examples
///
/// ```
/// use facegate_protocol::Command;
/// use facegate_core::{DeviceKind, PowerState};
///
/// assert_eq!(Command::Grant.to_string(), "GRANTED");
///
/// let cmd = Command::set_power(DeviceKind::Fan, PowerState::On);
/// assert_eq!(cmd.to_string(), "FAN:ON");
/// assert_eq!(cmd.encode(), b"FAN:ON\n");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Release the door.
    Grant,

    /// Switch an actuator on or off.
    SetPower {
        device: DeviceKind,
        state: PowerState,
    },
}

impl Command {
    pub fn set_power(device: DeviceKind, state: PowerState) -> Self {
        Self::SetPower { device, state }
    }

    /// Encode as a newline-terminated line ready for the wire.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = self.to_string().into_bytes();
        bytes.push(b'\n');
        bytes
    }

    #[must_use]
    pub fn is_grant(&self) -> bool {
        matches!(self, Self::Grant)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grant => f.write_str(GRANT_TOKEN),
            Self::SetPower { device, state } => write!(
                f,
                "{}{}{}",
                device.command_token(),
                COMMAND_SEPARATOR,
                state.command_token()
            ),
        }
    }
}

impl std::str::FromStr for Command {
    type Err = Error;

    /// Parse a command line as the controller firmware would.
    ///
    /// Tokens are uppercase on the wire; a trailing newline is tolerated.
    fn from_str(s: &str) -> Result<Self> {
        let line = s.trim_end_matches(['\r', '\n']);

        if line == GRANT_TOKEN {
            return Ok(Self::Grant);
        }

        let (device, state) = line
            .split_once(COMMAND_SEPARATOR)
            .ok_or_else(|| Error::InvalidCommand(line.to_string()))?;

        if device != device.to_ascii_uppercase() || state != state.to_ascii_uppercase() {
            return Err(Error::InvalidCommand(line.to_string()));
        }

        Ok(Self::SetPower {
            device: device.parse()?,
            state: state.parse()?,
        })
    }
}
