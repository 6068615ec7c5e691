//! Mock feature extractor for testing and development.
//!
//! Frames are opaque byte strings; the test decides which frame "contains"
//! which face by registering it on the handle. Unregistered frames contain
//! no face.

use crate::traits::FaceExtractor;
use crate::{HardwareError, Result};
use facegate_core::FaceSignature;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Script {
    faces: HashMap<Vec<u8>, FaceSignature>,
    failure: Option<String>,
    calls: usize,
}

/// Mock face extractor.
///
/// # Examples
///
/// ```
/// use facegate_hardware::mock::MockFaceExtractor;
/// use facegate_hardware::traits::FaceExtractor;
/// use facegate_core::FaceSignature;
///
/// #[tokio::main]
/// async fn main() -> facegate_hardware::Result<()> {
///     let (extractor, handle) = MockFaceExtractor::new();
///
///     let signature = FaceSignature::new(vec![0.1, 0.2, 0.3])?;
///     handle.register_face(b"frame-alice", signature.clone());
///
///     assert_eq!(extractor.extract(b"frame-alice").await?, Some(signature));
///     assert_eq!(extractor.extract(b"empty-hallway").await?, None);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockFaceExtractor {
    script: Arc<Mutex<Script>>,
}

impl MockFaceExtractor {
    /// Create a new mock extractor and its control handle.
    pub fn new() -> (Self, MockFaceExtractorHandle) {
        let script = Arc::new(Mutex::new(Script::default()));
        (
            Self {
                script: Arc::clone(&script),
            },
            MockFaceExtractorHandle { script },
        )
    }
}

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FaceExtractor for MockFaceExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Option<FaceSignature>> {
        let mut script = lock(&self.script);
        script.calls += 1;

        if let Some(message) = &script.failure {
            return Err(HardwareError::extraction(message.clone()));
        }

        Ok(script.faces.get(image).cloned())
    }
}

/// Handle for programming a [`MockFaceExtractor`].
#[derive(Debug, Clone)]
pub struct MockFaceExtractorHandle {
    script: Arc<Mutex<Script>>,
}

impl MockFaceExtractorHandle {
    /// Make `frame` yield `signature`.
    pub fn register_face(&self, frame: &[u8], signature: FaceSignature) {
        lock(&self.script).faces.insert(frame.to_vec(), signature);
    }

    /// Forget a registered frame; it will yield no face.
    pub fn forget_face(&self, frame: &[u8]) -> Option<FaceSignature> {
        lock(&self.script).faces.remove(frame)
    }

    /// Make every extraction fail with `message` until cleared.
    pub fn fail_with(&self, message: impl Into<String>) {
        lock(&self.script).failure = Some(message.into());
    }

    /// Clear a scripted failure.
    pub fn clear_failure(&self) {
        lock(&self.script).failure = None;
    }

    /// Number of `extract` calls so far.
    pub fn call_count(&self) -> usize {
        lock(&self.script).calls
    }
}
