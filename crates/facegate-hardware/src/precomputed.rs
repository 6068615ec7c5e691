//! Extractor for frames that already carry a signature.
//!
//! Lets an external extraction tool do the model work: it writes the
//! signature as a JSON array and hands those bytes over as the "frame". An
//! empty array means the tool found no face.

use crate::traits::FaceExtractor;
use crate::{HardwareError, Result};
use facegate_core::FaceSignature;

/// Reads signatures serialized as JSON arrays of numbers.
///
/// # Examples
///
/// ```
/// use facegate_hardware::PrecomputedExtractor;
/// use facegate_hardware::traits::FaceExtractor;
///
/// #[tokio::main]
/// async fn main() -> facegate_hardware::Result<()> {
///     let extractor = PrecomputedExtractor::new();
///
///     let signature = extractor.extract(b"[0.12, -0.03, 0.5]").await?.unwrap();
///     assert_eq!(signature.dimension(), 3);
///
///     assert!(extractor.extract(b"[]").await?.is_none());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrecomputedExtractor {
    expected_dimension: Option<usize>,
}

impl PrecomputedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject signatures whose length differs from `dimension`.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.expected_dimension = Some(dimension);
        self
    }
}

impl FaceExtractor for PrecomputedExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Option<FaceSignature>> {
        let values: Vec<f64> = serde_json::from_slice(image)
            .map_err(|e| HardwareError::extraction(format!("not a signature array: {e}")))?;

        if values.is_empty() {
            return Ok(None);
        }

        if let Some(expected) = self.expected_dimension
            && values.len() != expected
        {
            return Err(facegate_core::Error::InvalidSignature {
                expected,
                actual: values.len(),
            }
            .into());
        }

        Ok(Some(FaceSignature::new(values)?))
    }
}
