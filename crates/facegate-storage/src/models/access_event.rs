use chrono::{DateTime, Utc};
use facegate_core::{Identity, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an authentication attempt ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    /// Best distance was within the threshold.
    Matched,

    /// Best distance exceeded the threshold.
    ThresholdExceeded,

    /// Nothing was enrolled to compare against.
    NoCandidates,

    /// The frame contained no detectable face.
    NoFace,

    /// The captured signature cannot be compared with the enrolled ones.
    DimensionMismatch,
}

impl AccessOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::ThresholdExceeded => "threshold_exceeded",
            Self::NoCandidates => "no_candidates",
            Self::NoFace => "no_face",
            Self::DimensionMismatch => "dimension_mismatch",
        }
    }

    /// Verdict implied by this outcome.
    pub fn verdict(self) -> Verdict {
        match self {
            Self::Matched => Verdict::Matched,
            _ => Verdict::Rejected,
        }
    }
}

impl fmt::Display for AccessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matched" => Ok(Self::Matched),
            "threshold_exceeded" => Ok(Self::ThresholdExceeded),
            "no_candidates" => Ok(Self::NoCandidates),
            "no_face" => Ok(Self::NoFace),
            "dimension_mismatch" => Ok(Self::DimensionMismatch),
            other => Err(format!("unknown access outcome: {other}")),
        }
    }
}

/// One authentication attempt, as recorded in the `access_events` table.
///
/// Events are append-only. Identity columns are denormalized so an event
/// still reads correctly after the identity is removed.
///
/// # Examples
///
/// ```
/// use facegate_storage::models::{AccessEvent, AccessOutcome};
/// use facegate_core::{Identity, Verdict};
///
/// let alice = Identity::named("alice").unwrap();
/// let event = AccessEvent::new(Some(&alice), AccessOutcome::Matched, Some(0.31));
///
/// assert!(event.was_matched());
/// assert_eq!(event.get_verdict(), Some(Verdict::Matched));
/// assert_eq!(event.identity_id.as_deref(), Some("alice"));
///
/// let stranger = AccessEvent::new(None, AccessOutcome::ThresholdExceeded, Some(0.92));
/// assert!(!stranger.was_matched());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessEvent {
    /// Auto-increment primary key (0 before insertion)
    pub id: i64,

    /// When the attempt happened
    pub timestamp: DateTime<Utc>,

    /// Resolved identity, if the attempt matched
    pub identity_id: Option<String>,

    pub display_name: Option<String>,

    /// `matched` or `rejected`
    pub verdict: String,

    /// Best distance found, if any candidate was compared
    pub distance: Option<f64>,

    /// Outcome reason (see [`AccessOutcome`])
    pub reason: String,

    /// When the row was written
    pub created_at: DateTime<Utc>,
}

impl AccessEvent {
    /// Build an event stamped with the current time.
    pub fn new(identity: Option<&Identity>, outcome: AccessOutcome, distance: Option<f64>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            timestamp: now,
            identity_id: identity.map(|i| i.id.to_string()),
            display_name: identity.map(|i| i.display_name.clone()),
            verdict: outcome.verdict().as_str().to_string(),
            distance,
            reason: outcome.as_str().to_string(),
            created_at: now,
        }
    }

    pub fn get_verdict(&self) -> Option<Verdict> {
        self.verdict.parse().ok()
    }

    pub fn get_outcome(&self) -> Option<AccessOutcome> {
        self.reason.parse().ok()
    }

    pub fn was_matched(&self) -> bool {
        self.get_verdict().is_some_and(Verdict::is_matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AccessOutcome::Matched, Verdict::Matched)]
    #[case(AccessOutcome::ThresholdExceeded, Verdict::Rejected)]
    #[case(AccessOutcome::NoCandidates, Verdict::Rejected)]
    #[case(AccessOutcome::NoFace, Verdict::Rejected)]
    #[case(AccessOutcome::DimensionMismatch, Verdict::Rejected)]
    fn test_outcome_verdict(#[case] outcome: AccessOutcome, #[case] verdict: Verdict) {
        assert_eq!(outcome.verdict(), verdict);
        assert_eq!(outcome.as_str().parse::<AccessOutcome>().unwrap(), outcome);
    }

    #[test]
    fn test_event_without_identity() {
        let event = AccessEvent::new(None, AccessOutcome::NoFace, None);
        assert_eq!(event.identity_id, None);
        assert_eq!(event.display_name, None);
        assert_eq!(event.verdict, "rejected");
        assert_eq!(event.get_outcome(), Some(AccessOutcome::NoFace));
    }

    #[test]
    fn test_unknown_reason() {
        let mut event = AccessEvent::new(None, AccessOutcome::NoFace, None);
        event.reason = "tailgating".to_string();
        assert_eq!(event.get_outcome(), None);
    }
}
