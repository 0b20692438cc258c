use serde::{Deserialize, Serialize};

use crate::core::MatchResult;
use crate::models::domain::ScoredCandidate;

/// Response for the ranking endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankMatchesResponse {
    pub matches: Vec<ScoredCandidate>,
    pub total_candidates: usize,
    /// Candidates dropped by the distance bound
    pub excluded: usize,
}

impl From<MatchResult> for RankMatchesResponse {
    fn from(result: MatchResult) -> Self {
        Self {
            matches: result.matches,
            total_candidates: result.total_candidates,
            excluded: result.excluded,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
