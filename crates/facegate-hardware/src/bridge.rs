//! Device control facade over the link and the mirror.

use crate::link::TransportLink;
use crate::mirror::DeviceMirror;
use crate::types::{DeviceSnapshot, SensorSnapshot};
use crate::{HardwareError, Result};
use chrono::{DateTime, Utc};
use facegate_core::{DeviceKind, PowerState};
use facegate_protocol::Command;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a device toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PowerChange {
    /// Mirror entry after the optimistic update.
    pub device: DeviceSnapshot,

    /// Whether the command reached the controller.
    pub delivered: bool,
}

/// Sends device commands and answers state queries from the mirror.
///
/// # Examples
///
/// ```
/// use facegate_hardware::{DeviceBridge, DeviceMirror, LinkConfig, Provenance, TransportLink};
/// use facegate_hardware::mock::MockSerial;
/// use facegate_core::{DeviceKind, PowerState};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let (connector, controller) = MockSerial::new();
///     let link = Arc::new(TransportLink::new(LinkConfig::new("mock"), connector));
///     let bridge = DeviceBridge::new(link, Arc::new(DeviceMirror::new()));
///
///     let change = bridge.set_power(DeviceKind::Lights, PowerState::On).await;
///     assert!(change.delivered);
///     assert_eq!(change.device.provenance, Provenance::Optimistic);
///     assert_eq!(controller.written_lines(), vec!["LIGHTS:ON"]);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DeviceBridge {
    link: Arc<TransportLink>,
    mirror: Arc<DeviceMirror>,
}

impl DeviceBridge {
    pub fn new(link: Arc<TransportLink>, mirror: Arc<DeviceMirror>) -> Self {
        Self { link, mirror }
    }

    pub fn link(&self) -> &Arc<TransportLink> {
        &self.link
    }

    pub fn mirror(&self) -> &Arc<DeviceMirror> {
        &self.mirror
    }

    /// Switch a device and record the intent in the mirror.
    ///
    /// The intent is applied whether or not the command was delivered; the
    /// next status packet corrects it either way.
    pub async fn set_power(&self, device: DeviceKind, state: PowerState) -> PowerChange {
        let command = Command::set_power(device, state);
        let link = Arc::clone(&self.link);

        let sent = tokio::task::spawn_blocking(move || link.send(&command))
            .await
            .unwrap_or_else(|e| Err(HardwareError::other(format!("send task failed: {e}"))));

        let delivered = match sent {
            Ok(()) => true,
            Err(e) => {
                warn!(device = %device, state = %state, error = %e, "Device command not delivered");
                false
            }
        };

        self.mirror.apply_optimistic_intent(device, state);
        info!(device = %device, state = %state, delivered, "Device state requested");

        PowerChange {
            device: self.mirror.device(device),
            delivered,
        }
    }

    /// Like [`set_power`](Self::set_power), parsing device and state names.
    ///
    /// # Errors
    /// Returns `HardwareError::Core` for an unknown device or state; nothing
    /// is sent in that case.
    pub async fn set_power_by_name(&self, device: &str, state: &str) -> Result<PowerChange> {
        let device: DeviceKind = device.parse()?;
        let state: PowerState = state.parse()?;
        Ok(self.set_power(device, state).await)
    }

    pub fn snapshot_sensors(&self) -> SensorSnapshot {
        self.mirror.snapshot_sensors()
    }

    pub fn snapshot_devices(&self) -> Vec<DeviceSnapshot> {
        self.mirror.snapshot_devices()
    }

    /// Time the controller was last heard from.
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.mirror.last_update()
    }
}
