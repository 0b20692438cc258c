use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

use crate::models::domain::{CandidateRecord, CareSpecialty, Requester, TraitSet};

/// Per-call filters and overrides for a ranking pass
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    /// Hard distance bound in kilometres; overrides the requester's stored bound
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0))]
    pub max_distance: Option<f64>,
    /// Traits to score against; overrides the requester's stored traits
    #[serde(default)]
    pub personality_traits: Option<TraitSet>,
    #[serde(default)]
    pub specialized_care: Option<BTreeSet<CareSpecialty>>,
    #[serde(default)]
    pub last_minute: Option<bool>,
}

/// Request to rank childminders for the authenticated parent
///
/// POST /api/v1/matches/rank
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RankMatchesRequest {
    #[serde(default)]
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
    #[serde(flatten)]
    #[validate(nested)]
    pub filters: MatchRequest,
}

/// Stateless ranking over a caller-supplied pool
///
/// POST /api/v1/matches/preview
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreviewMatchesRequest {
    #[validate(nested)]
    pub requester: Requester,
    pub candidates: Vec<CandidateRecord>,
    #[serde(default)]
    #[validate(nested)]
    pub request: MatchRequest,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
}
