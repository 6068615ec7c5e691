pub mod access_event;
pub mod signature;

pub use access_event::{AccessEventRepository, SqliteAccessEventRepository};
pub use signature::{SignatureStore, SqliteSignatureStore};
