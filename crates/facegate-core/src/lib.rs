//! Shared domain types for the Facegate access controller.
//!
//! Identities, face signatures and their comparison, controller devices and
//! their power states, plus the error type and tuning constants every other
//! crate builds on.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
