use std::cmp::Ordering;

use crate::core::{
    distance::distance_between,
    filters::exceeds_max_distance,
    scoring::{calculate_match_score, ScoringContext},
};
use crate::models::{Candidate, MatchRequest, Requester, ScoredCandidate, TraitSet};

/// Result of the matching process
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<ScoredCandidate>,
    pub total_candidates: usize,
    /// Candidates dropped by the distance bound
    pub excluded: usize,
}

/// Tunables of the ranking pass that are not per-requester
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingConfig {
    /// Score given when no sub-score contributed
    pub baseline_score: f64,
    /// Years of experience that earn the full experience sub-score
    pub experience_cap_years: f64,
    /// Radius the distance sub-score is normalised against when no bound is set
    pub reference_radius_km: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            baseline_score: 0.5,
            experience_cap_years: 10.0,
            reference_radius_km: 25.0,
        }
    }
}

/// Ranks a verified candidate pool for one requester
///
/// # Pipeline
/// 1. Distance (hard exclusion beyond the bound)
/// 2. Experience, rating and personality sub-scores
/// 3. Baseline fallback
/// 4. Stable sort by descending score
///
/// Stateless and free of I/O; one instance is shared by all request handlers.
#[derive(Debug, Clone)]
pub struct Matcher {
    config: MatchingConfig,
}

impl Matcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self {
            config: MatchingConfig::default(),
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Rank candidates for a requester
    ///
    /// The request's distance bound and traits take precedence over the ones
    /// stored on the requester. Ties keep their input order.
    pub fn rank(
        &self,
        requester: &Requester,
        candidates: Vec<Candidate>,
        request: &MatchRequest,
    ) -> Vec<ScoredCandidate> {
        let max_distance = request.max_distance.or(requester.max_distance_km);
        let no_traits = TraitSet::new();
        let requested_traits = request
            .personality_traits
            .as_ref()
            .or(requester.personality_traits.as_ref())
            .unwrap_or(&no_traits);

        let ctx = ScoringContext {
            weights: &requester.weights,
            radius_km: max_distance.unwrap_or(self.config.reference_radius_km),
            requested_traits,
            experience_cap_years: self.config.experience_cap_years,
            baseline_score: self.config.baseline_score,
        };

        let total = candidates.len();
        let mut ranked: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let distance_km = distance_between(requester.coordinate, candidate.coordinate);

                if exceeds_max_distance(distance_km, max_distance) {
                    tracing::trace!("Excluding {} at {:?} km", candidate.id, distance_km);
                    return None;
                }

                let (score, breakdown) = calculate_match_score(&candidate, distance_km, &ctx);
                Some(ScoredCandidate::new(candidate, distance_km, score, breakdown))
            })
            .collect();

        // sort_by is stable, so equal scores keep insertion order
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        tracing::debug!(
            "Ranked {} of {} candidates for {} (max distance: {:?})",
            ranked.len(),
            total,
            requester.id,
            max_distance
        );

        ranked
    }

    /// Rank and keep the top `limit`
    pub fn find_matches(
        &self,
        requester: &Requester,
        candidates: Vec<Candidate>,
        request: &MatchRequest,
        limit: usize,
    ) -> MatchResult {
        let total_candidates = candidates.len();
        let mut matches = self.rank(requester, candidates, request);
        let excluded = total_candidates - matches.len();

        matches.truncate(limit);

        MatchResult {
            matches,
            total_candidates,
            excluded,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}
