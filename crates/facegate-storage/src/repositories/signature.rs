#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::enrollment::encode_embedding;
use crate::models::{EnrollmentSummary, SampleRow};
use chrono::Utc;
use facegate_core::{Candidate, EnrollmentPolicy, FaceSignature, Identity, IdentityId};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Repository trait for enrolled face signatures
///
/// The store owns persistence of signatures and their reduction to one
/// comparable vector per identity. Its enrollment policy is fixed for the
/// lifetime of the instance.
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024 feature),
/// eliminating the need for the async-trait crate while maintaining
/// full async/await support in trait methods.
pub trait SignatureStore: Send + Sync {
    /// One candidate per enrolled identity, in enrollment order.
    ///
    /// Under [`EnrollmentPolicy::MultiSample`] each candidate carries the
    /// centroid of the identity's samples.
    async fn list_all(&self) -> StorageResult<Vec<Candidate>>;

    /// Store a sample for `identity`, enrolling it if new.
    ///
    /// Returns the number of samples now stored for the identity.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidSignature` if the sample's dimension
    /// differs from the samples already stored.
    async fn upsert(&self, identity: &Identity, signature: FaceSignature) -> StorageResult<usize>;

    /// Remove an identity and all its samples.
    ///
    /// # Errors
    /// Returns `StorageError::NotFound` if the identity was not enrolled.
    async fn remove(&self, identity_id: &IdentityId) -> StorageResult<()>;

    /// Summaries of every enrolled identity, in enrollment order.
    async fn list_enrollments(&self) -> StorageResult<Vec<EnrollmentSummary>>;

    /// Summary of one identity, if enrolled.
    async fn find_enrollment(
        &self,
        identity_id: &IdentityId,
    ) -> StorageResult<Option<EnrollmentSummary>>;

    /// The policy this store applies on upsert.
    fn policy(&self) -> EnrollmentPolicy;
}

/// SQLite implementation of SignatureStore
pub struct SqliteSignatureStore {
    pool: SqlitePool,
    policy: EnrollmentPolicy,
}

impl SqliteSignatureStore {
    /// Create a store with the default (multi-sample) policy
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_policy(pool, EnrollmentPolicy::default())
    }

    /// Create a store with an explicit enrollment policy
    pub fn with_policy(pool: SqlitePool, policy: EnrollmentPolicy) -> Self {
        Self { pool, policy }
    }
}

impl SignatureStore for SqliteSignatureStore {
    async fn list_all(&self) -> StorageResult<Vec<Candidate>> {
        let rows = sqlx::query_as::<_, SampleRow>(
            r#"
            SELECT e.identity_id, e.display_name, s.embedding, s.dimension
            FROM enrolled_identities e
            JOIN face_samples s ON s.identity_id = e.identity_id
            ORDER BY e.created_at, e.rowid, s.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        // Rows arrive grouped by identity.
        let candidates = rows
            .chunk_by(|a, b| a.identity_id == b.identity_id)
            .map(|group| {
                let samples = group
                    .iter()
                    .map(SampleRow::signature)
                    .collect::<StorageResult<Vec<_>>>()?;
                reduce(&group[0], &samples)
            })
            .collect::<StorageResult<Vec<_>>>()?;

        debug!(candidates = candidates.len(), "Loaded enrolled signatures");
        Ok(candidates)
    }

    async fn upsert(&self, identity: &Identity, signature: FaceSignature) -> StorageResult<usize> {
        let dimension = signature.dimension();
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // Writing first takes the write lock before the dimension read.
        sqlx::query(
            r#"
            INSERT INTO enrolled_identities (identity_id, display_name, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(identity_id) DO UPDATE SET
                display_name = excluded.display_name,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(identity.id.as_str())
        .bind(&identity.display_name)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // A replaced sample does not constrain its own replacement.
        let existing: Option<(i64,)> = match self.policy {
            EnrollmentPolicy::MultiSample => {
                sqlx::query_as("SELECT dimension FROM face_samples LIMIT 1")
                    .fetch_optional(&mut *tx)
                    .await?
            }
            EnrollmentPolicy::SingleActive => {
                sqlx::query_as("SELECT dimension FROM face_samples WHERE identity_id != ? LIMIT 1")
                    .bind(identity.id.as_str())
                    .fetch_optional(&mut *tx)
                    .await?
            }
        };

        if let Some((stored,)) = existing
            && usize::try_from(stored).ok() != Some(dimension)
        {
            return Err(StorageError::InvalidSignature {
                expected: usize::try_from(stored).unwrap_or_default(),
                actual: dimension,
            });
        }

        if self.policy == EnrollmentPolicy::SingleActive {
            sqlx::query("DELETE FROM face_samples WHERE identity_id = ?")
                .bind(identity.id.as_str())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO face_samples (identity_id, embedding, dimension, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(identity.id.as_str())
        .bind(encode_embedding(&signature))
        .bind(dimension as i64)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM face_samples WHERE identity_id = ?")
                .bind(identity.id.as_str())
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        info!(
            identity = %identity.id,
            samples = count,
            policy = %self.policy,
            "Face sample enrolled"
        );
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn remove(&self, identity_id: &IdentityId) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM enrolled_identities WHERE identity_id = ?")
            .bind(identity_id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::identity_not_found(identity_id.as_str()));
        }

        info!(identity = %identity_id, "Enrollment removed");
        Ok(())
    }

    async fn list_enrollments(&self) -> StorageResult<Vec<EnrollmentSummary>> {
        let summaries = sqlx::query_as::<_, EnrollmentSummary>(
            r#"
            SELECT e.identity_id, e.display_name,
                   COUNT(s.id) AS sample_count,
                   MAX(s.dimension) AS dimension,
                   e.created_at, e.updated_at
            FROM enrolled_identities e
            LEFT JOIN face_samples s ON s.identity_id = e.identity_id
            GROUP BY e.identity_id
            ORDER BY e.created_at, e.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }

    async fn find_enrollment(
        &self,
        identity_id: &IdentityId,
    ) -> StorageResult<Option<EnrollmentSummary>> {
        let summary = sqlx::query_as::<_, EnrollmentSummary>(
            r#"
            SELECT e.identity_id, e.display_name,
                   COUNT(s.id) AS sample_count,
                   MAX(s.dimension) AS dimension,
                   e.created_at, e.updated_at
            FROM enrolled_identities e
            LEFT JOIN face_samples s ON s.identity_id = e.identity_id
            WHERE e.identity_id = ?
            GROUP BY e.identity_id
            "#,
        )
        .bind(identity_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(summary)
    }

    fn policy(&self) -> EnrollmentPolicy {
        self.policy
    }
}

fn reduce(head: &SampleRow, samples: &[FaceSignature]) -> StorageResult<Candidate> {
    let signature = FaceSignature::centroid(samples)?;
    Ok(Candidate::new(head.identity()?, signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;

    async fn store(policy: EnrollmentPolicy) -> SqliteSignatureStore {
        let db = Database::in_memory().await.unwrap();
        SqliteSignatureStore::with_policy(db.pool().clone(), policy)
    }

    fn sig(values: &[f64]) -> FaceSignature {
        FaceSignature::new(values.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = store(EnrollmentPolicy::MultiSample).await;
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.list_enrollments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_multi_sample_reduces_to_centroid() {
        let store = store(EnrollmentPolicy::MultiSample).await;
        let alice = Identity::named("alice").unwrap();

        assert_eq!(store.upsert(&alice, sig(&[1.0, 0.0])).await.unwrap(), 1);
        assert_eq!(store.upsert(&alice, sig(&[3.0, 2.0])).await.unwrap(), 2);

        let candidates = store.list_all().await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].identity, alice);
        assert_eq!(candidates[0].signature.as_slice(), &[2.0, 1.0]);
    }

    #[tokio::test]
    async fn test_single_active_replaces() {
        let store = store(EnrollmentPolicy::SingleActive).await;
        let bob = Identity::named("bob").unwrap();

        store.upsert(&bob, sig(&[1.0, 1.0])).await.unwrap();
        assert_eq!(store.upsert(&bob, sig(&[0.5, 0.25])).await.unwrap(), 1);

        let candidates = store.list_all().await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].signature.as_slice(), &[0.5, 0.25]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = store(EnrollmentPolicy::MultiSample).await;
        store
            .upsert(&Identity::named("alice").unwrap(), sig(&[0.1, 0.2, 0.3]))
            .await
            .unwrap();

        let err = store
            .upsert(&Identity::named("bob").unwrap(), sig(&[0.1, 0.2]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidSignature {
                expected: 3,
                actual: 2
            }
        ));

        // Nothing from the failed upsert was kept.
        assert_eq!(store.list_enrollments().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_single_active_may_replace_only_sample_with_new_dimension() {
        let store = store(EnrollmentPolicy::SingleActive).await;
        let carol = Identity::named("carol").unwrap();

        store.upsert(&carol, sig(&[0.1, 0.2])).await.unwrap();
        store.upsert(&carol, sig(&[0.1, 0.2, 0.3])).await.unwrap();

        let candidates = store.list_all().await.unwrap();
        assert_eq!(candidates[0].signature.dimension(), 3);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = store(EnrollmentPolicy::MultiSample).await;
        let alice = Identity::named("alice").unwrap();
        store.upsert(&alice, sig(&[0.0])).await.unwrap();
        store.upsert(&alice, sig(&[1.0])).await.unwrap();

        store.remove(&alice.id).await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());

        let (orphans,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM face_samples")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);

        let err = store.remove(&alice.id).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_display_name_updates_on_reenroll() {
        let store = store(EnrollmentPolicy::MultiSample).await;
        let id = IdentityId::new("u-1").unwrap();

        store
            .upsert(&Identity::new(id.clone(), "Al").unwrap(), sig(&[0.0]))
            .await
            .unwrap();
        store
            .upsert(&Identity::new(id.clone(), "Alice").unwrap(), sig(&[0.0]))
            .await
            .unwrap();

        let summary = store.find_enrollment(&id).await.unwrap().unwrap();
        assert_eq!(summary.display_name, "Alice");
        assert_eq!(summary.sample_count, 2);
        assert_eq!(summary.dimension, Some(1));
        assert!(summary.updated_at >= summary.created_at);
    }
}
