//! Boundary traits for hardware collaborators.
//!
//! Two seams are defined here:
//!
//! - [`SerialConnector`] opens the byte stream to the controller board. It is
//!   synchronous and object-safe: the link owns it as a trait object and only
//!   ever calls it from blocking contexts.
//! - [`FaceExtractor`] turns image bytes into a [`FaceSignature`]. It is an
//!   async trait and therefore dispatched through
//!   [`AnyFaceExtractor`](crate::devices::AnyFaceExtractor) rather than
//!   `Box<dyn _>`.

#![allow(async_fn_in_trait)]

use crate::{LinkConfig, Result};
use facegate_core::FaceSignature;
use std::io::{Read, Write};

/// Independent read and write halves of one open serial connection.
///
/// The halves must refer to the same underlying port so that closing the
/// writer and dropping the reader fully releases it.
pub struct SerialHalves {
    pub reader: Box<dyn Read + Send>,
    pub writer: Box<dyn Write + Send>,
}

impl std::fmt::Debug for SerialHalves {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialHalves").finish_non_exhaustive()
    }
}

/// Opens connections to the controller board.
///
/// Reads on the returned reader half must honor `config.read_timeout` by
/// failing with `io::ErrorKind::TimedOut`. End of stream (`Ok(0)`) means the
/// peer is gone.
///
/// # Examples
///
/// ```
/// use facegate_hardware::mock::MockSerial;
/// use facegate_hardware::traits::SerialConnector;
/// use facegate_hardware::LinkConfig;
///
/// let (connector, controller) = MockSerial::new();
/// let halves = connector.open(&LinkConfig::new("mock")).unwrap();
/// assert_eq!(controller.open_count(), 1);
/// # drop(halves);
/// ```
pub trait SerialConnector: Send + Sync {
    /// Open a new connection.
    ///
    /// # Errors
    /// Returns `HardwareError::OpenFailed` if the port cannot be opened.
    fn open(&self, config: &LinkConfig) -> Result<SerialHalves>;
}

/// Feature-extraction capability: image bytes in, face signature out.
///
/// The model itself is an external collaborator. Implementations return
/// `Ok(None)` when the image holds no detectable face; errors are reserved
/// for failures of the extractor itself.
///
/// # Object Safety
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generics, or the enum wrapper in
/// [`devices`](crate::devices) when the concrete extractor is chosen at
/// runtime.
///
/// # Examples
///
/// ```no_run
/// use facegate_hardware::traits::FaceExtractor;
/// use facegate_hardware::Result;
///
/// async fn has_face<E: FaceExtractor>(extractor: &E, frame: &[u8]) -> Result<bool> {
///     Ok(extractor.extract(frame).await?.is_some())
/// }
/// ```
pub trait FaceExtractor: Send + Sync {
    /// Extract the signature of the single face in `image`.
    ///
    /// # Errors
    /// Returns `HardwareError::ExtractionFailed` if the image cannot be
    /// processed at all.
    async fn extract(&self, image: &[u8]) -> Result<Option<FaceSignature>>;
}
