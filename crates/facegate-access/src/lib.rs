//! Identity resolution and access authorization for Facegate.
//!
//! - [`Matcher`] - nearest-neighbour decision over enrolled signatures
//! - [`AuthorizationCoordinator`] - extraction, matching, door grant, event
//!   log and session issuance for one attempt
//! - [`SessionIssuer`] - boundary to credential issuance
//!
//! # Example
//!
//! ```no_run
//! use facegate_access::{AuthorizationCoordinator, Matcher, MatcherConfig, OpaqueTokenIssuer};
//! use facegate_core::EnrollmentPolicy;
//! use facegate_hardware::{LinkConfig, PrecomputedExtractor, SerialPortConnector, TransportLink};
//! use facegate_storage::{Database, DatabaseConfig, SqliteAccessEventRepository, SqliteSignatureStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("facegate.db")).await?;
//! let policy = EnrollmentPolicy::MultiSample;
//! let link = Arc::new(TransportLink::new(LinkConfig::new("/dev/ttyUSB0"), SerialPortConnector::new()));
//!
//! let coordinator = AuthorizationCoordinator::new(
//!     PrecomputedExtractor::new(),
//!     SqliteSignatureStore::with_policy(db.pool().clone(), policy),
//!     SqliteAccessEventRepository::new(db.pool().clone()),
//!     OpaqueTokenIssuer::default(),
//!     Matcher::new(MatcherConfig::for_policy(policy))?,
//!     link,
//! );
//!
//! let frame = std::fs::read("capture.json")?;
//! match coordinator.authorize(&frame).await {
//!     Ok(auth) => println!("Welcome, {}", auth.identity.display_name),
//!     Err(e) if e.is_client_error() => println!("Denied: {e}"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod error;
pub mod matcher;
pub mod session;

pub use coordinator::{Authorization, AuthorizationCoordinator, DoorState, DoorStatus, Enrollment};
pub use error::{AccessError, Result};
pub use matcher::{MatchResult, Matcher, MatcherConfig};
pub use session::{OpaqueTokenIssuer, SessionConfig, SessionCredential, SessionIssuer};
