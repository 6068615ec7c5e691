//! Nearest-neighbour identity resolution.
//!
//! The matcher compares a query signature against every candidate by
//! Euclidean distance and accepts the closest one if it lies within the
//! configured threshold. It holds no state beyond its configuration and can
//! be shared freely between tasks.

use crate::error::{AccessError, Result};
use facegate_core::constants::{DEFAULT_CENTROID_THRESHOLD, DEFAULT_SINGLE_SAMPLE_THRESHOLD};
use facegate_core::{Candidate, EnrollmentPolicy, FaceSignature, Identity, Verdict};
use serde::{Deserialize, Serialize};

/// Matcher configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Largest distance still accepted as a match (inclusive).
    pub threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SINGLE_SAMPLE_THRESHOLD,
        }
    }
}

impl MatcherConfig {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Default threshold for signatures stored under `policy`.
    ///
    /// Centroids of several samples sit closer to fresh captures than a
    /// single sample does, so multi-sample stores get the tighter threshold.
    pub fn for_policy(policy: EnrollmentPolicy) -> Self {
        match policy {
            EnrollmentPolicy::MultiSample => Self::new(DEFAULT_CENTROID_THRESHOLD),
            EnrollmentPolicy::SingleActive => Self::new(DEFAULT_SINGLE_SAMPLE_THRESHOLD),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// # Errors
    /// Returns `AccessError::InvalidInput` unless the threshold is finite and
    /// positive.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(AccessError::invalid_input(format!(
                "Match threshold must be finite and positive, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Outcome of resolving one query signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum MatchResult {
    /// Closest candidate was within the threshold.
    Matched { identity: Identity, distance: f64 },

    /// No candidate was close enough. `best_distance` is `None` when there
    /// was nothing to compare against.
    Rejected { best_distance: Option<f64> },
}

impl MatchResult {
    pub fn verdict(&self) -> Verdict {
        match self {
            Self::Matched { .. } => Verdict::Matched,
            Self::Rejected { .. } => Verdict::Rejected,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Matched { identity, .. } => Some(identity),
            Self::Rejected { .. } => None,
        }
    }

    /// Distance to the closest candidate, if any was compared.
    pub fn distance(&self) -> Option<f64> {
        match self {
            Self::Matched { distance, .. } => Some(*distance),
            Self::Rejected { best_distance } => *best_distance,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    pub fn is_no_candidates(&self) -> bool {
        matches!(self, Self::Rejected { best_distance: None })
    }

    /// `1 - distance`, clamped to `0.0..=1.0`.
    pub fn confidence(&self) -> Option<f64> {
        self.distance().map(confidence_from_distance)
    }
}

pub(crate) fn confidence_from_distance(distance: f64) -> f64 {
    (1.0 - distance).clamp(0.0, 1.0)
}

/// Resolves query signatures against enrolled candidates.
///
/// # Examples
///
/// ```
/// use facegate_access::{Matcher, MatcherConfig};
/// use facegate_core::{Candidate, FaceSignature, Identity};
///
/// let matcher = Matcher::new(MatcherConfig::new(0.6)).unwrap();
/// let candidates = vec![
///     Candidate::new(Identity::named("alice").unwrap(), FaceSignature::new(vec![0.0, 0.0]).unwrap()),
///     Candidate::new(Identity::named("bob").unwrap(), FaceSignature::new(vec![1.0, 1.0]).unwrap()),
/// ];
///
/// let query = FaceSignature::new(vec![0.1, 0.2]).unwrap();
/// let result = matcher.resolve(&query, &candidates).unwrap();
/// assert_eq!(result.identity().map(|i| i.id.as_str()), Some("alice"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    /// # Errors
    /// Returns `AccessError::InvalidInput` for an invalid threshold.
    pub fn new(config: MatcherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Find the closest candidate and decide whether it is close enough.
    ///
    /// Ties on distance go to the candidate that comes first in
    /// `candidates`. An empty candidate list is a rejection, not an error.
    ///
    /// # Errors
    /// Returns `AccessError::InvalidSignature` if any candidate's dimension
    /// differs from the query's. Nothing is compared in that case.
    pub fn resolve(&self, query: &FaceSignature, candidates: &[Candidate]) -> Result<MatchResult> {
        for candidate in candidates {
            candidate.signature.ensure_same_dimension(query)?;
        }

        let mut best: Option<(&Candidate, f64)> = None;
        for candidate in candidates {
            let distance = query.euclidean_distance(&candidate.signature)?;
            if best.is_none_or(|(_, current)| distance < current) {
                best = Some((candidate, distance));
            }
        }

        Ok(match best {
            Some((candidate, distance)) if distance <= self.config.threshold => {
                MatchResult::Matched {
                    identity: candidate.identity.clone(),
                    distance,
                }
            }
            Some((_, distance)) => MatchResult::Rejected {
                best_distance: Some(distance),
            },
            None => MatchResult::Rejected {
                best_distance: None,
            },
        })
    }
}
