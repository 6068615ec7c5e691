use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use facegate_core::{FaceSignature, Identity, IdentityId};
use serde::{Deserialize, Serialize};

/// One stored face sample joined with its identity.
///
/// Maps a row of `face_samples` joined to `enrolled_identities`. The
/// embedding is the signature's components as little-endian `f64`s.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SampleRow {
    pub identity_id: String,
    pub display_name: String,
    pub embedding: Vec<u8>,
    pub dimension: i64,
}

impl SampleRow {
    /// Rebuild the identity this sample belongs to.
    pub fn identity(&self) -> StorageResult<Identity> {
        Ok(Identity::new(
            IdentityId::new(&self.identity_id)?,
            &self.display_name,
        )?)
    }

    /// Decode the stored signature.
    ///
    /// # Errors
    /// Returns `StorageError::Corrupted` if the blob length disagrees with
    /// the recorded dimension or a component is not finite.
    pub fn signature(&self) -> StorageResult<FaceSignature> {
        decode_embedding(&self.embedding, self.dimension)
    }
}

/// Summary of one enrolled identity, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnrollmentSummary {
    pub identity_id: String,
    pub display_name: String,

    /// Number of stored samples.
    pub sample_count: i64,

    /// Signature dimension, `None` if no sample is stored.
    pub dimension: Option<i64>,

    /// When the identity was first enrolled.
    pub created_at: DateTime<Utc>,

    /// When a sample was last added.
    pub updated_at: DateTime<Utc>,
}

/// Encode a signature for the `embedding` column.
pub fn encode_embedding(signature: &FaceSignature) -> Vec<u8> {
    signature
        .as_slice()
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

/// Decode an `embedding` column value.
pub fn decode_embedding(bytes: &[u8], dimension: i64) -> StorageResult<FaceSignature> {
    let expected_len = usize::try_from(dimension)
        .ok()
        .and_then(|d| d.checked_mul(8))
        .ok_or_else(|| StorageError::Corrupted(format!("invalid dimension {dimension}")))?;

    if bytes.len() != expected_len {
        return Err(StorageError::Corrupted(format!(
            "embedding holds {} bytes, expected {expected_len}",
            bytes.len()
        )));
    }

    let values = bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect();

    FaceSignature::new(values).map_err(|e| StorageError::Corrupted(e.to_string()))
}
