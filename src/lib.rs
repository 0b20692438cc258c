//! Minder Match - childminder matching service for the childcare marketplace
//!
//! Ranks verified childminders against a parent's preferences with a weighted
//! multi-factor score: distance, experience, rating and personality overlap.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use self::core::{Matcher, MatchingConfig, distance::{haversine_distance, distance_between}};
pub use models::{Candidate, CandidateRecord, MatchRequest, Requester, ScoredCandidate, PreferenceWeights};
