//! In-process mirror of the controller's sensors and actuators.
//!
//! The mirror has two writers: the link's reader thread, applying status
//! packets in wire order, and request handlers applying optimistic intents
//! after a toggle. Both go through one mutex that is never held across I/O.
//! Inbound packets are ground truth: whichever write lands last wins, and an
//! inbound report always replaces an optimistic value.

use crate::types::{DeviceSnapshot, Provenance, SensorSnapshot};
use chrono::{DateTime, Utc};
use facegate_core::{DeviceKind, PowerState};
use facegate_protocol::StatusPacket;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
struct DeviceEntry {
    state: PowerState,
    provenance: Provenance,
}

#[derive(Debug, Default)]
struct MirrorState {
    temperature: Option<f64>,
    humidity: Option<f64>,
    motion: bool,
    devices: BTreeMap<DeviceKind, DeviceEntry>,
    last_update: Option<DateTime<Utc>>,
}

/// Shared mirror of remote hardware state.
///
/// # Examples
///
/// ```
/// use facegate_hardware::{DeviceMirror, Provenance};
/// use facegate_core::{DeviceKind, PowerState};
/// use facegate_protocol::StatusPacket;
///
/// let mirror = DeviceMirror::new();
///
/// mirror.apply_optimistic_intent(DeviceKind::Fan, PowerState::On);
/// let fan = mirror.device(DeviceKind::Fan);
/// assert_eq!(fan.state, PowerState::On);
/// assert_eq!(fan.provenance, Provenance::Optimistic);
///
/// mirror.apply_inbound(&StatusPacket::parse(r#"{"fan":"off"}"#).unwrap());
/// let fan = mirror.device(DeviceKind::Fan);
/// assert_eq!(fan.state, PowerState::Off);
/// assert_eq!(fan.provenance, Provenance::Reported);
/// ```
#[derive(Debug)]
pub struct DeviceMirror {
    state: Mutex<MirrorState>,
}

impl DeviceMirror {
    /// Create a mirror with no sensor readings and every device off.
    pub fn new() -> Self {
        let devices = DeviceKind::ALL
            .iter()
            .map(|kind| (*kind, DeviceEntry::default()))
            .collect();

        Self {
            state: Mutex::new(MirrorState {
                devices,
                ..MirrorState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MirrorState> {
        // The state is plain data; a panic mid-update cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge a status packet into the mirror.
    ///
    /// Only fields present in the packet are touched. Devices reported in
    /// the packet become [`Provenance::Reported`] and `last_update` is set
    /// to now, even for a packet with no recognized field.
    pub fn apply_inbound(&self, packet: &StatusPacket) {
        let mut state = self.lock();

        if let Some(temp) = packet.temp {
            state.temperature = Some(temp);
        }
        if let Some(hum) = packet.hum {
            state.humidity = Some(hum);
        }
        if let Some(motion) = packet.motion {
            state.motion = motion;
        }

        for kind in DeviceKind::ALL {
            if let Some(power) = packet.device_state(kind) {
                state.devices.insert(
                    kind,
                    DeviceEntry {
                        state: power,
                        provenance: Provenance::Reported,
                    },
                );
            }
        }

        state.last_update = Some(Utc::now());
        trace!(packet = %packet.to_line(), "Applied status packet");
    }

    /// Record a locally requested device state before the controller
    /// confirms it. Does not touch `last_update`.
    pub fn apply_optimistic_intent(&self, device: DeviceKind, power: PowerState) {
        let mut state = self.lock();
        state.devices.insert(
            device,
            DeviceEntry {
                state: power,
                provenance: Provenance::Optimistic,
            },
        );
    }

    /// Copy of the sensor readings.
    pub fn snapshot_sensors(&self) -> SensorSnapshot {
        let state = self.lock();
        SensorSnapshot {
            temperature: state.temperature,
            humidity: state.humidity,
            motion: state.motion,
            last_update: state.last_update,
        }
    }

    /// Copy of every device, in [`DeviceKind::ALL`] order.
    pub fn snapshot_devices(&self) -> Vec<DeviceSnapshot> {
        let state = self.lock();
        state
            .devices
            .iter()
            .map(|(kind, entry)| DeviceSnapshot {
                device: *kind,
                state: entry.state,
                provenance: entry.provenance,
            })
            .collect()
    }

    /// Copy of a single device.
    pub fn device(&self, device: DeviceKind) -> DeviceSnapshot {
        let entry = self.lock().devices.get(&device).copied().unwrap_or_default();
        DeviceSnapshot {
            device,
            state: entry.state,
            provenance: entry.provenance,
        }
    }

    /// Time of the last inbound packet, if any arrived.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.lock().last_update
    }
}

impl Default for DeviceMirror {
    fn default() -> Self {
        Self::new()
    }
}
