use crate::models::{Candidate, CandidateRecord, MatchRequest};

/// Hard distance filter
///
/// Only a distance that was actually computed can exclude a candidate; an
/// unknown distance or an absent bound never does.
#[inline]
pub fn exceeds_max_distance(distance_km: Option<f64>, max_distance_km: Option<f64>) -> bool {
    match (distance_km, max_distance_km) {
        (Some(distance), Some(bound)) => distance > bound,
        _ => false,
    }
}

/// Check the request's care requirements against a candidate
///
/// Applied while the pool is assembled, before ranking.
#[inline]
pub fn meets_care_requirements(candidate: &Candidate, request: &MatchRequest) -> bool {
    if request.last_minute == Some(true) && !candidate.last_minute {
        return false;
    }

    match &request.specialized_care {
        Some(required) => required.is_subset(&candidate.specialized_care),
        None => true,
    }
}

/// Turn storage records into the pool handed to the matcher
///
/// Records missing either verification flag are dropped, as are candidates
/// that do not meet the request's care requirements.
pub fn assemble_pool(records: Vec<CandidateRecord>, request: &MatchRequest) -> Vec<Candidate> {
    let fetched = records.len();
    let pool: Vec<Candidate> = records
        .into_iter()
        .filter(|record| {
            if !record.is_verified() {
                tracing::debug!("Skipping unverified candidate {}", record.id);
            }
            record.is_verified()
        })
        .map(Candidate::from_record)
        .filter(|candidate| meets_care_requirements(candidate, request))
        .collect();

    tracing::debug!("Assembled pool of {} from {} records", pool.len(), fetched);
    pool
}
