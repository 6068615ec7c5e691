//! Error taxonomy for authorization decisions.
//!
//! Decision outcomes that end an attempt without a grant (`NoFaceDetected`,
//! `NoCandidates`, `RejectedMatch`) are errors so that callers handle them
//! with `?`; [`AccessError::is_client_error`] separates them from failures
//! of the system itself.

use facegate_hardware::HardwareError;
use facegate_storage::StorageError;

/// Result type alias for access operations.
pub type Result<T> = std::result::Result<T, AccessError>;

/// Errors that can end an authorization or enrollment.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Request could not be processed as given.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The frame contained no detectable face.
    #[error("No face detected")]
    NoFaceDetected,

    /// Nothing is enrolled to match against.
    #[error("No enrolled identities")]
    NoCandidates,

    /// Best candidate was farther than the threshold.
    #[error("Face not recognised (best distance {distance:.4})")]
    RejectedMatch { distance: f64 },

    /// Signature dimension disagrees with the enrolled signatures.
    #[error("Signature dimension mismatch: expected {expected}, got {actual}")]
    InvalidSignature { expected: usize, actual: usize },

    /// Identity is not enrolled.
    #[error("Identity not enrolled: {0}")]
    NotEnrolled(String),

    /// Hardware collaborator failed.
    #[error("Transport failure: {0}")]
    TransportFailure(#[source] HardwareError),

    /// Signature store or event log failed.
    #[error("Store failure: {0}")]
    StoreFailure(#[source] StorageError),
}

impl AccessError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether the caller, not the system, is responsible for the failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::TransportFailure(_) | Self::StoreFailure(_))
    }
}

impl From<facegate_core::Error> for AccessError {
    fn from(error: facegate_core::Error) -> Self {
        match error {
            facegate_core::Error::InvalidSignature { expected, actual } => {
                Self::InvalidSignature { expected, actual }
            }
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

impl From<HardwareError> for AccessError {
    fn from(error: HardwareError) -> Self {
        match error {
            HardwareError::Core(core) => core.into(),
            HardwareError::ExtractionFailed { message } => Self::InvalidInput(message),
            other => Self::TransportFailure(other),
        }
    }
}

impl From<StorageError> for AccessError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::InvalidSignature { expected, actual } => {
                Self::InvalidSignature { expected, actual }
            }
            StorageError::NotFound { value, .. } => Self::NotEnrolled(value),
            StorageError::Validation(message) => Self::InvalidInput(message),
            other => Self::StoreFailure(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AccessError::NoFaceDetected, true)]
    #[case(AccessError::NoCandidates, true)]
    #[case(AccessError::RejectedMatch { distance: 0.7 }, true)]
    #[case(AccessError::InvalidSignature { expected: 128, actual: 64 }, true)]
    #[case(AccessError::NotEnrolled("alice".into()), true)]
    #[case(AccessError::TransportFailure(HardwareError::communication("port closed")), false)]
    #[case(AccessError::StoreFailure(StorageError::Corrupted("x".into())), false)]
    fn test_client_error_classification(#[case] error: AccessError, #[case] client: bool) {
        assert_eq!(error.is_client_error(), client);
    }

    #[test]
    fn test_dimension_mismatch_converges() {
        let from_core: AccessError = facegate_core::Error::InvalidSignature {
            expected: 3,
            actual: 2,
        }
        .into();
        let from_store: AccessError = StorageError::InvalidSignature {
            expected: 3,
            actual: 2,
        }
        .into();
        let from_hardware: AccessError = HardwareError::Core(facegate_core::Error::InvalidSignature {
            expected: 3,
            actual: 2,
        })
        .into();

        for error in [from_core, from_store, from_hardware] {
            assert!(matches!(
                error,
                AccessError::InvalidSignature {
                    expected: 3,
                    actual: 2
                }
            ));
        }
    }

    #[test]
    fn test_not_found_maps_to_not_enrolled() {
        let error: AccessError = StorageError::identity_not_found("ghost").into();
        assert!(matches!(error, AccessError::NotEnrolled(ref id) if id == "ghost"));
    }

    #[test]
    fn test_extraction_failure_is_client_error() {
        let error: AccessError = HardwareError::extraction("not an image").into();
        assert!(error.is_client_error());
        assert_eq!(error.to_string(), "Invalid input: not an image");
    }

    #[test]
    fn test_rejected_display() {
        let error = AccessError::RejectedMatch { distance: 0.71234 };
        assert_eq!(error.to_string(), "Face not recognised (best distance 0.7123)");
    }
}
