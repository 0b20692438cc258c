// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BoundingBox, Candidate, CandidateRecord, CareSpecialty, Coordinate, FiredSubScores,
    PersonalityTrait, PreferenceWeights, Requester, ScoreBreakdown, ScoredCandidate, TraitSet,
};
pub use requests::{MatchRequest, PreviewMatchesRequest, RankMatchesRequest};
pub use responses::{ErrorResponse, HealthResponse, RankMatchesResponse};
