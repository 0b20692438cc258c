// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod matcher;
pub mod scoring;

pub use distance::{calculate_bounding_box, distance_between, haversine_distance, is_within_bounding_box};
pub use filters::{assemble_pool, exceeds_max_distance, meets_care_requirements};
pub use matcher::{MatchResult, Matcher, MatchingConfig};
pub use scoring::{calculate_match_score, parse_experience_years, ScoringContext};
