//! Authorization flow: extract, match, grant, record.
//!
//! The coordinator is the only component that reaches from the decision
//! pipeline into the hardware. A grant that cannot be delivered is logged and
//! otherwise ignored; the decision, the recorded event and the returned
//! authorization are the same as if it had been delivered.

use crate::error::{AccessError, Result};
use crate::matcher::{MatchResult, Matcher, confidence_from_distance};
use crate::session::{SessionCredential, SessionIssuer};
use chrono::{DateTime, Utc};
use facegate_core::{Identity, IdentityId};
use facegate_hardware::traits::FaceExtractor;
use facegate_hardware::{HardwareError, TransportLink};
use facegate_protocol::Command;
use facegate_storage::{
    AccessEvent, AccessEventRepository, AccessOutcome, EnrollmentSummary, SignatureStore,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Door lock state as last commanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    #[default]
    Idle,
    Granted,
}

/// Most recent grant, for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DoorStatus {
    pub state: DoorState,
    pub identity: Option<Identity>,
    pub granted_at: Option<DateTime<Utc>>,
}

/// A successful authorization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Authorization {
    pub identity: Identity,
    pub distance: f64,
    pub confidence: f64,
    pub session: SessionCredential,
    pub granted_at: DateTime<Utc>,
}

/// Result of an enroll call: who was enrolled, how many samples they now
/// have, and the signature dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    pub identity: Identity,
    pub sample_count: usize,
    pub dimension: usize,
}

/// Runs authentication attempts end to end.
///
/// Every attempt that reaches a decision appends exactly one
/// [`AccessEvent`]. Attempts share no mutable state other than the door
/// status, so any number may run concurrently.
pub struct AuthorizationCoordinator<E, S, A, I> {
    extractor: E,
    store: S,
    events: A,
    issuer: I,
    matcher: Matcher,
    link: Arc<TransportLink>,
    door: Mutex<DoorStatus>,
}

impl<E, S, A, I> std::fmt::Debug for AuthorizationCoordinator<E, S, A, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationCoordinator")
            .field("matcher", &self.matcher)
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

impl<E, S, A, I> AuthorizationCoordinator<E, S, A, I>
where
    E: FaceExtractor,
    S: SignatureStore,
    A: AccessEventRepository,
    I: SessionIssuer,
{
    pub fn new(
        extractor: E,
        store: S,
        events: A,
        issuer: I,
        matcher: Matcher,
        link: Arc<TransportLink>,
    ) -> Self {
        Self {
            extractor,
            store,
            events,
            issuer,
            matcher,
            link,
            door: Mutex::new(DoorStatus::default()),
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn link(&self) -> &Arc<TransportLink> {
        &self.link
    }

    /// Decide whether the face in `frame` may enter.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty or unreadable frame (nothing recorded)
    /// - `NoFaceDetected`, `NoCandidates`, `RejectedMatch` for a decided
    ///   rejection (event recorded)
    /// - `InvalidSignature` if the extracted signature cannot be compared
    ///   with the enrolled ones (event recorded)
    /// - `StoreFailure` if candidates cannot be loaded or the event cannot
    ///   be written
    pub async fn authorize(&self, frame: &[u8]) -> Result<Authorization> {
        if frame.is_empty() {
            return Err(AccessError::invalid_input("No image provided"));
        }

        let Some(query) = self.extractor.extract(frame).await? else {
            self.record(None, AccessOutcome::NoFace, None).await?;
            info!(verdict = "rejected", reason = %AccessOutcome::NoFace, "Access denied");
            return Err(AccessError::NoFaceDetected);
        };

        let candidates = self.store.list_all().await?;
        let result = match self.matcher.resolve(&query, &candidates) {
            Ok(result) => result,
            Err(e @ AccessError::InvalidSignature { .. }) => {
                self.record(None, AccessOutcome::DimensionMismatch, None)
                    .await?;
                info!(
                    verdict = "rejected",
                    reason = %AccessOutcome::DimensionMismatch,
                    "Access denied"
                );
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        debug!(
            candidates = candidates.len(),
            best_distance = ?result.distance(),
            threshold = self.matcher.threshold(),
            "Match evaluated"
        );

        match result {
            MatchResult::Matched { identity, distance } => {
                self.send_grant(&identity).await;

                let granted_at = Utc::now();
                *self.door() = DoorStatus {
                    state: DoorState::Granted,
                    identity: Some(identity.clone()),
                    granted_at: Some(granted_at),
                };

                self.record(Some(&identity), AccessOutcome::Matched, Some(distance))
                    .await?;
                let session = self.issuer.issue(&identity)?;

                info!(identity = %identity.id, distance, verdict = "matched", "Access granted");
                Ok(Authorization {
                    identity,
                    distance,
                    confidence: confidence_from_distance(distance),
                    session,
                    granted_at,
                })
            }
            MatchResult::Rejected {
                best_distance: None,
            } => {
                self.record(None, AccessOutcome::NoCandidates, None).await?;
                info!(verdict = "rejected", reason = %AccessOutcome::NoCandidates, "Access denied");
                Err(AccessError::NoCandidates)
            }
            MatchResult::Rejected {
                best_distance: Some(distance),
            } => {
                self.record(None, AccessOutcome::ThresholdExceeded, Some(distance))
                    .await?;
                info!(
                    verdict = "rejected",
                    reason = %AccessOutcome::ThresholdExceeded,
                    distance,
                    "Access denied"
                );
                Err(AccessError::RejectedMatch { distance })
            }
        }
    }

    /// Extract a signature from `frame` and store it for `identity`.
    ///
    /// # Errors
    /// `NoFaceDetected` if the frame holds no face, `InvalidSignature` if
    /// its dimension differs from the enrolled ones.
    pub async fn enroll(&self, identity: &Identity, frame: &[u8]) -> Result<Enrollment> {
        if frame.is_empty() {
            return Err(AccessError::invalid_input("No image provided"));
        }

        let signature = self
            .extractor
            .extract(frame)
            .await?
            .ok_or(AccessError::NoFaceDetected)?;
        let dimension = signature.dimension();
        let sample_count = self.store.upsert(identity, signature).await?;

        Ok(Enrollment {
            identity: identity.clone(),
            sample_count,
            dimension,
        })
    }

    /// # Errors
    /// `NotEnrolled` if the identity has no enrollment.
    pub async fn remove(&self, identity_id: &IdentityId) -> Result<()> {
        self.store.remove(identity_id).await?;
        Ok(())
    }

    pub async fn list_enrollments(&self) -> Result<Vec<EnrollmentSummary>> {
        Ok(self.store.list_enrollments().await?)
    }

    pub async fn recent_events(&self, limit: i64) -> Result<Vec<AccessEvent>> {
        Ok(self.events.find_recent(limit).await?)
    }

    pub fn door_status(&self) -> DoorStatus {
        self.door().clone()
    }

    async fn send_grant(&self, identity: &Identity) {
        let link = Arc::clone(&self.link);
        let sent = tokio::task::spawn_blocking(move || link.send(&Command::Grant))
            .await
            .unwrap_or_else(|e| Err(HardwareError::other(format!("send task failed: {e}"))));

        if let Err(e) = sent {
            error!(identity = %identity.id, error = %e, "Grant command not delivered");
        }
    }

    async fn record(
        &self,
        identity: Option<&Identity>,
        outcome: AccessOutcome,
        distance: Option<f64>,
    ) -> Result<i64> {
        let event = AccessEvent::new(identity, outcome, distance);
        self.events.create(&event).await.map_err(|e| {
            warn!(reason = %outcome, error = %e, "Failed to record access event");
            AccessError::from(e)
        })
    }

    fn door(&self) -> MutexGuard<'_, DoorStatus> {
        self.door.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatcherConfig;
    use crate::session::OpaqueTokenIssuer;
    use facegate_core::{FaceSignature, Verdict};
    use facegate_hardware::LinkConfig;
    use facegate_hardware::mock::{
        MockController, MockFaceExtractor, MockFaceExtractorHandle, MockSerial,
    };
    use facegate_storage::{Database, SqliteAccessEventRepository, SqliteSignatureStore};

    type TestCoordinator = AuthorizationCoordinator<
        MockFaceExtractor,
        SqliteSignatureStore,
        SqliteAccessEventRepository,
        OpaqueTokenIssuer,
    >;

    struct Fixture {
        coordinator: TestCoordinator,
        faces: MockFaceExtractorHandle,
        controller: MockController,
        _db: Database,
    }

    async fn fixture() -> Fixture {
        let db = Database::in_memory().await.unwrap();
        let (extractor, faces) = MockFaceExtractor::new();
        let (connector, controller) = MockSerial::new();
        let link = Arc::new(TransportLink::new(LinkConfig::new("mock"), connector));

        let coordinator = AuthorizationCoordinator::new(
            extractor,
            SqliteSignatureStore::new(db.pool().clone()),
            SqliteAccessEventRepository::new(db.pool().clone()),
            OpaqueTokenIssuer::default(),
            Matcher::new(MatcherConfig::new(0.6)).unwrap(),
            link,
        );

        Fixture {
            coordinator,
            faces,
            controller,
            _db: db,
        }
    }

    fn sig(values: &[f64]) -> FaceSignature {
        FaceSignature::new(values.to_vec()).unwrap()
    }

    async fn enroll(f: &Fixture, name: &str, values: &[f64]) -> Identity {
        let identity = Identity::named(name).unwrap();
        let frame = format!("enroll-{name}");
        f.faces.register_face(frame.as_bytes(), sig(values));
        f.coordinator.enroll(&identity, frame.as_bytes()).await.unwrap();
        identity
    }

    #[tokio::test]
    async fn test_match_grants_and_records() {
        let f = fixture().await;
        let alice = enroll(&f, "alice", &[0.0, 0.0]).await;
        f.faces.register_face(b"capture", sig(&[0.3, 0.4]));

        let auth = f.coordinator.authorize(b"capture").await.unwrap();

        assert_eq!(auth.identity, alice);
        assert!((auth.distance - 0.5).abs() < 1e-12);
        assert!((auth.confidence - 0.5).abs() < 1e-12);
        assert_eq!(auth.session.identity_id, alice.id);
        assert_eq!(f.controller.written_lines(), vec!["GRANTED"]);

        let door = f.coordinator.door_status();
        assert_eq!(door.state, DoorState::Granted);
        assert_eq!(door.identity, Some(alice));
        assert_eq!(door.granted_at, Some(auth.granted_at));

        let events = f.coordinator.recent_events(10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].get_verdict(), Some(Verdict::Matched));
        assert_eq!(events[0].identity_id.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_grant_transport_failure_does_not_change_outcome() {
        let f = fixture().await;
        enroll(&f, "alice", &[0.0, 0.0]).await;
        f.faces.register_face(b"capture", sig(&[0.0, 0.1]));
        f.controller.set_write_failure(true);

        let auth = f.coordinator.authorize(b"capture").await.unwrap();

        assert_eq!(auth.identity.id.as_str(), "alice");
        assert!(f.controller.written_lines().is_empty());
        assert_eq!(f.coordinator.door_status().state, DoorState::Granted);

        let events = f.coordinator.recent_events(10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].was_matched());
    }

    #[tokio::test]
    async fn test_unreachable_controller_does_not_change_outcome() {
        let f = fixture().await;
        enroll(&f, "alice", &[0.0]).await;
        f.faces.register_face(b"capture", sig(&[0.0]));
        f.controller.fail_next_opens(usize::MAX);

        assert!(f.coordinator.authorize(b"capture").await.is_ok());
        assert!(f.coordinator.recent_events(1).await.unwrap()[0].was_matched());
    }

    #[tokio::test]
    async fn test_rejection_records_and_sends_nothing() {
        let f = fixture().await;
        enroll(&f, "alice", &[0.0, 0.0]).await;
        f.faces.register_face(b"stranger", sig(&[3.0, 4.0]));

        let err = f.coordinator.authorize(b"stranger").await.unwrap_err();

        assert!(matches!(err, AccessError::RejectedMatch { distance } if (distance - 5.0).abs() < 1e-12));
        assert!(f.controller.written_lines().is_empty());
        assert_eq!(f.coordinator.door_status(), DoorStatus::default());

        let events = f.coordinator.recent_events(10).await.unwrap();
        assert_eq!(events[0].get_outcome(), Some(AccessOutcome::ThresholdExceeded));
        assert_eq!(events[0].identity_id, None);
        assert_eq!(events[0].distance, Some(5.0));
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let f = fixture().await;
        f.faces.register_face(b"capture", sig(&[0.1]));

        let err = f.coordinator.authorize(b"capture").await.unwrap_err();

        assert!(matches!(err, AccessError::NoCandidates));
        let events = f.coordinator.recent_events(10).await.unwrap();
        assert_eq!(events[0].get_outcome(), Some(AccessOutcome::NoCandidates));
    }

    #[tokio::test]
    async fn test_no_face() {
        let f = fixture().await;
        enroll(&f, "alice", &[0.0]).await;

        let err = f.coordinator.authorize(b"empty-hallway").await.unwrap_err();

        assert!(matches!(err, AccessError::NoFaceDetected));
        let events = f.coordinator.recent_events(10).await.unwrap();
        assert_eq!(events[0].get_outcome(), Some(AccessOutcome::NoFace));
        assert!(!events[0].was_matched());
    }

    #[tokio::test]
    async fn test_empty_frame_records_nothing() {
        let f = fixture().await;

        let err = f.coordinator.authorize(b"").await.unwrap_err();

        assert!(matches!(err, AccessError::InvalidInput(_)));
        assert!(f.coordinator.recent_events(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extractor_failure_is_invalid_input() {
        let f = fixture().await;
        f.faces.fail_with("could not decode image");

        let err = f.coordinator.authorize(b"garbage").await.unwrap_err();

        assert!(err.is_client_error());
        assert!(f.coordinator.recent_events(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_surfaces() {
        let f = fixture().await;
        enroll(&f, "alice", &[0.0, 0.0]).await;
        f.faces.register_face(b"odd", sig(&[0.0, 0.0, 0.0]));

        let err = f.coordinator.authorize(b"odd").await.unwrap_err();
        assert!(matches!(err, AccessError::InvalidSignature { expected: 2, actual: 3 }));

        let events = f.coordinator.recent_events(10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].get_outcome(), Some(AccessOutcome::DimensionMismatch));
        assert!(!events[0].was_matched());
        assert_eq!(events[0].distance, None);
        assert!(f.controller.written_lines().is_empty());

        let err = f
            .coordinator
            .enroll(&Identity::named("bob").unwrap(), b"odd")
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::InvalidSignature { expected: 2, actual: 3 }));
    }

    #[tokio::test]
    async fn test_enroll_and_remove() {
        let f = fixture().await;
        let alice = enroll(&f, "alice", &[0.0, 1.0]).await;

        f.faces.register_face(b"second", sig(&[1.0, 1.0]));
        let enrollment = f.coordinator.enroll(&alice, b"second").await.unwrap();
        assert_eq!(enrollment.sample_count, 2);
        assert_eq!(enrollment.dimension, 2);

        let listed = f.coordinator.list_enrollments().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].sample_count, 2);

        f.coordinator.remove(&alice.id).await.unwrap();
        assert!(f.coordinator.list_enrollments().await.unwrap().is_empty());

        let err = f.coordinator.remove(&alice.id).await.unwrap_err();
        assert!(matches!(err, AccessError::NotEnrolled(_)));
    }

    #[tokio::test]
    async fn test_enroll_without_face() {
        let f = fixture().await;
        let err = f
            .coordinator
            .enroll(&Identity::named("alice").unwrap(), b"blank")
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NoFaceDetected));
    }
}
