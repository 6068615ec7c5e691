//! Wire formats for the controller serial link.
//!
//! The controller speaks a line-oriented protocol in both directions:
//!
//! ```text
//! controller -> host   {"temp":25.3,"hum":60.1,"motion":1,"fan":"on","lights":"off"}
//! controller -> host   free-form diagnostic text (logged, never parsed)
//! host -> controller   GRANTED
//! host -> controller   FAN:ON | FAN:OFF | LIGHTS:ON | LIGHTS:OFF
//! ```
//!
//! - [`StatusPacket`]: strict schema for inbound status records
//! - [`Command`]: outbound command encoding
//! - [`classify_line`]: decides whether a raw inbound line is a packet or a
//!   diagnostic

pub mod command;
pub mod line;
pub mod packet;

pub use command::Command;
pub use line::{InboundLine, classify_line};
pub use packet::StatusPacket;
