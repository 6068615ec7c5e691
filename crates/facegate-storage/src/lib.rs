//! Storage layer for the Facegate access controller.
//!
//! SQLite-backed persistence for enrolled face signatures and the access
//! event log.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`SignatureStore`] - Enrolled signatures, reduced to one candidate per
//!   identity according to an [`EnrollmentPolicy`](facegate_core::EnrollmentPolicy)
//! - [`AccessEventRepository`] - Append-only log of authentication attempts
//!
//! # Signature Encoding
//!
//! Each sample is stored as a BLOB of little-endian `f64` components next to
//! its dimension. A schema `CHECK` ties the two together and decoding
//! re-verifies it, so a truncated blob surfaces as
//! [`StorageError::Corrupted`] instead of a short vector.
//!
//! # Examples
//!
//! ```no_run
//! use facegate_core::{EnrollmentPolicy, FaceSignature, Identity};
//! use facegate_storage::{Database, DatabaseConfig, SignatureStore, SqliteSignatureStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("facegate.db")).await?;
//! let store = SqliteSignatureStore::with_policy(db.pool().clone(), EnrollmentPolicy::MultiSample);
//!
//! let alice = Identity::named("alice")?;
//! store.upsert(&alice, FaceSignature::new(vec![0.12, -0.40, 0.33])?).await?;
//!
//! for candidate in store.list_all().await? {
//!     println!("{} ({} dims)", candidate.identity, candidate.signature.dimension());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Upserts run in a single transaction, so the dimension check and the
//! insert cannot interleave with another writer. WAL mode lets readers
//! proceed while a write is in flight.

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{AccessEvent, AccessOutcome, EnrollmentSummary, SampleRow};
pub use repositories::{
    AccessEventRepository, SignatureStore, SqliteAccessEventRepository, SqliteSignatureStore,
};
