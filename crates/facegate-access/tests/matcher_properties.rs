//! Property tests for the matcher's decision rule.

use facegate_access::{Matcher, MatcherConfig};
use facegate_core::{Candidate, FaceSignature, Identity};
use proptest::prelude::*;

fn candidates(vectors: &[Vec<f64>]) -> Vec<Candidate> {
    vectors
        .iter()
        .enumerate()
        .map(|(i, v)| {
            Candidate::new(
                Identity::named(&format!("id-{i}")).unwrap(),
                FaceSignature::new(v.clone()).unwrap(),
            )
        })
        .collect()
}

/// A query and up to eight candidates, all of one dimension.
fn scenario() -> impl Strategy<Value = (Vec<f64>, Vec<Vec<f64>>)> {
    (1usize..8).prop_flat_map(|dim| {
        (
            prop::collection::vec(-1.0f64..1.0, dim),
            prop::collection::vec(prop::collection::vec(-1.0f64..1.0, dim), 0..8),
        )
    })
}

proptest! {
    #[test]
    fn reported_distance_is_the_minimum((query, vectors) in scenario()) {
        let query = FaceSignature::new(query).unwrap();
        let candidates = candidates(&vectors);
        let result = Matcher::default().resolve(&query, &candidates).unwrap();

        let min = candidates
            .iter()
            .map(|c| query.euclidean_distance(&c.signature).unwrap())
            .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))));
        prop_assert_eq!(result.distance(), min);
        prop_assert_eq!(result.is_no_candidates(), candidates.is_empty());
    }

    #[test]
    fn matched_identity_is_earliest_at_minimum((query, vectors) in scenario()) {
        let query = FaceSignature::new(query).unwrap();
        let candidates = candidates(&vectors);
        // Large enough that every non-empty scenario matches.
        let matcher = Matcher::new(MatcherConfig::new(100.0)).unwrap();

        if let Some(identity) = matcher.resolve(&query, &candidates).unwrap().identity() {
            let distances: Vec<f64> = candidates
                .iter()
                .map(|c| query.euclidean_distance(&c.signature).unwrap())
                .collect();
            let winner = candidates.iter().position(|c| &c.identity == identity).unwrap();
            prop_assert!(distances[..winner].iter().all(|d| *d > distances[winner]));
            prop_assert!(distances[winner..].iter().all(|d| *d >= distances[winner]));
        } else {
            prop_assert!(candidates.is_empty());
        }
    }

    #[test]
    fn raising_threshold_never_unmatches(
        (query, vectors) in scenario(),
        low in 0.01f64..2.0,
        extra in 0.0f64..2.0,
    ) {
        let query = FaceSignature::new(query).unwrap();
        let candidates = candidates(&vectors);
        let strict = Matcher::new(MatcherConfig::new(low)).unwrap();
        let loose = Matcher::new(MatcherConfig::new(low + extra)).unwrap();

        let strict = strict.resolve(&query, &candidates).unwrap();
        let loose = loose.resolve(&query, &candidates).unwrap();
        if strict.is_matched() {
            prop_assert_eq!(strict, loose);
        }
    }

    #[test]
    fn enrolled_signature_matches_itself((query, vectors) in scenario()) {
        let mut vectors = vectors;
        vectors.push(query.clone());
        let query = FaceSignature::new(query).unwrap();

        let result = Matcher::default().resolve(&query, &candidates(&vectors)).unwrap();
        prop_assert!(result.is_matched());
        prop_assert_eq!(result.distance(), Some(0.0));
    }
}
