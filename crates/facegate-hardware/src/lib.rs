//! Hardware layer for the Facegate access controller.
//!
//! This crate owns everything that talks to something outside the process:
//!
//! - [`TransportLink`]: the line-oriented serial link to the controller
//!   board, with automatic reconnect and a dedicated reader thread.
//! - [`DeviceMirror`]: the in-process copy of the board's sensors and
//!   actuators, fed by the reader and by local intents.
//! - [`DeviceBridge`]: device toggles and state queries on top of the two.
//! - [`FaceExtractor`](traits::FaceExtractor): the boundary to the
//!   feature-extraction model.
//!
//! # Wiring
//!
//! ```no_run
//! use facegate_hardware::{DeviceBridge, DeviceMirror, LinkConfig, SerialPortConnector, TransportLink};
//! use std::sync::Arc;
//!
//! # fn main() -> facegate_hardware::Result<()> {
//! let link = Arc::new(TransportLink::new(
//!     LinkConfig::new("/dev/ttyUSB0"),
//!     SerialPortConnector::new(),
//! ));
//! let mirror = Arc::new(DeviceMirror::new());
//!
//! let reader = link.spawn_reader(Arc::clone(&mirror))?;
//! let bridge = DeviceBridge::new(link, mirror);
//!
//! println!("{:?}", bridge.snapshot_sensors());
//! reader.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The mirror and the link each guard their state with their own mutex, and
//! neither lock is held while the other is taken. Link writes block, so
//! async code calls [`TransportLink::send`] through
//! `tokio::task::spawn_blocking` (as [`DeviceBridge::set_power`] does).

pub mod bridge;
pub mod devices;
pub mod error;
pub mod link;
pub mod mirror;
pub mod mock;
pub mod precomputed;
pub mod serial;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use bridge::{DeviceBridge, PowerChange};
pub use devices::AnyFaceExtractor;
pub use error::{HardwareError, Result};
pub use link::{ReaderHandle, TransportLink};
pub use mirror::DeviceMirror;
pub use precomputed::PrecomputedExtractor;
pub use serial::{PortSummary, SerialPortConnector, available_ports};
pub use traits::{FaceExtractor, SerialConnector, SerialHalves};
pub use types::{DeviceSnapshot, LinkConfig, LinkState, Provenance, SensorSnapshot};
