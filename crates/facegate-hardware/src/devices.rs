//! Enum wrappers for extractor dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn FaceExtractor>`
//! is unavailable. [`AnyFaceExtractor`] provides concrete type dispatch for
//! code that picks the extractor at runtime, such as the CLI.
//!
//! # Examples
//!
//! ```
//! use facegate_hardware::devices::AnyFaceExtractor;
//! use facegate_hardware::PrecomputedExtractor;
//!
//! let extractor = AnyFaceExtractor::Precomputed(PrecomputedExtractor::new());
//! assert_eq!(extractor.name(), "precomputed");
//! ```

use crate::Result;
use crate::mock::MockFaceExtractor;
use crate::precomputed::PrecomputedExtractor;
use crate::traits::FaceExtractor;
use facegate_core::FaceSignature;

/// Enum wrapper for face extractor dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyFaceExtractor {
    /// Signatures computed by an external tool.
    Precomputed(PrecomputedExtractor),

    /// Mock extractor for development and testing.
    Mock(MockFaceExtractor),
}

impl AnyFaceExtractor {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Precomputed(_) => "precomputed",
            Self::Mock(_) => "mock",
        }
    }
}

impl FaceExtractor for AnyFaceExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Option<FaceSignature>> {
        match self {
            Self::Precomputed(extractor) => extractor.extract(image).await,
            Self::Mock(extractor) => extractor.extract(image).await,
        }
    }
}

impl From<PrecomputedExtractor> for AnyFaceExtractor {
    fn from(extractor: PrecomputedExtractor) -> Self {
        Self::Precomputed(extractor)
    }
}

impl From<MockFaceExtractor> for AnyFaceExtractor {
    fn from(extractor: MockFaceExtractor) -> Self {
        Self::Mock(extractor)
    }
}
