//! Mock implementations for testing and development.
//!
//! These can be controlled programmatically without a controller board or an
//! extraction model.

pub mod extractor;
pub mod serial;

pub use extractor::{MockFaceExtractor, MockFaceExtractorHandle};
pub use serial::{MockController, MockSerial};
