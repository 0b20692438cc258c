use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Build a coordinate from nullable storage columns.
    ///
    /// Returns `None` unless both parts are present and the point is valid.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        let point = Self::new(latitude?, longitude?);
        point.is_valid().then_some(point)
    }

    /// Finite and inside the WGS84 degree ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A tag string that does not name a known trait or care specialty
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tag: {0}")]
pub struct UnknownTag(pub String);

fn normalize_tag(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

/// Personality trait a childminder can advertise and a parent can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityTrait {
    Patient,
    Creative,
    Energetic,
    Calm,
    Nurturing,
    Playful,
    #[serde(alias = "organized")]
    Organised,
    Outdoorsy,
    Musical,
    Sporty,
    Bilingual,
    Structured,
}

impl PersonalityTrait {
    pub const ALL: [PersonalityTrait; 12] = [
        PersonalityTrait::Patient,
        PersonalityTrait::Creative,
        PersonalityTrait::Energetic,
        PersonalityTrait::Calm,
        PersonalityTrait::Nurturing,
        PersonalityTrait::Playful,
        PersonalityTrait::Organised,
        PersonalityTrait::Outdoorsy,
        PersonalityTrait::Musical,
        PersonalityTrait::Sporty,
        PersonalityTrait::Bilingual,
        PersonalityTrait::Structured,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonalityTrait::Patient => "patient",
            PersonalityTrait::Creative => "creative",
            PersonalityTrait::Energetic => "energetic",
            PersonalityTrait::Calm => "calm",
            PersonalityTrait::Nurturing => "nurturing",
            PersonalityTrait::Playful => "playful",
            PersonalityTrait::Organised => "organised",
            PersonalityTrait::Outdoorsy => "outdoorsy",
            PersonalityTrait::Musical => "musical",
            PersonalityTrait::Sporty => "sporty",
            PersonalityTrait::Bilingual => "bilingual",
            PersonalityTrait::Structured => "structured",
        }
    }
}

impl FromStr for PersonalityTrait {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_tag(s);
        if normalized == "organized" {
            return Ok(PersonalityTrait::Organised);
        }
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// Specialised care a childminder is able to provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareSpecialty {
    Infants,
    SpecialNeeds,
    Allergies,
    Overnight,
    SchoolPickup,
    HomeworkHelp,
}

impl CareSpecialty {
    pub const ALL: [CareSpecialty; 6] = [
        CareSpecialty::Infants,
        CareSpecialty::SpecialNeeds,
        CareSpecialty::Allergies,
        CareSpecialty::Overnight,
        CareSpecialty::SchoolPickup,
        CareSpecialty::HomeworkHelp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CareSpecialty::Infants => "infants",
            CareSpecialty::SpecialNeeds => "special_needs",
            CareSpecialty::Allergies => "allergies",
            CareSpecialty::Overnight => "overnight",
            CareSpecialty::SchoolPickup => "school_pickup",
            CareSpecialty::HomeworkHelp => "homework_help",
        }
    }
}

impl FromStr for CareSpecialty {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_tag(s);
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

pub type TraitSet = BTreeSet<PersonalityTrait>;

/// Parse a stored tag list into a typed set.
///
/// Accepts a JSON array of strings, or a string holding such an array (older
/// rows were written that way). Anything else yields an empty set and a
/// warning; unknown or non-string entries are skipped.
pub fn parse_tag_list<T>(raw: &Value, field: &str, owner_id: &str) -> BTreeSet<T>
where
    T: FromStr + Ord,
{
    let decoded: Vec<Value>;
    let items = match raw {
        Value::Null => return BTreeSet::new(),
        Value::Array(items) => items,
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => {
                decoded = items;
                &decoded
            }
            _ => {
                tracing::warn!("Malformed {} for {}: not a JSON array, treating as empty", field, owner_id);
                return BTreeSet::new();
            }
        },
        other => {
            tracing::warn!(
                "Malformed {} for {}: expected array, got {}, treating as empty",
                field,
                owner_id,
                json_kind(other)
            );
            return BTreeSet::new();
        }
    };

    items
        .iter()
        .filter_map(|item| {
            let Some(tag) = item.as_str() else {
                tracing::debug!("Skipping non-string {} entry for {}", field, owner_id);
                return None;
            };
            match tag.parse::<T>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    tracing::debug!("Skipping unknown {} entry {:?} for {}", field, tag, owner_id);
                    None
                }
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Per-requester weights for the four sub-scores
///
/// The sum is not constrained; callers may weight above 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreferenceWeights {
    pub distance: f64,
    pub experience: f64,
    pub rating: f64,
    pub personality: f64,
}

impl PreferenceWeights {
    pub fn sum(&self) -> f64 {
        self.distance + self.experience + self.rating + self.personality
    }

    /// All weights finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.distance, self.experience, self.rating, self.personality]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

impl Default for PreferenceWeights {
    fn default() -> Self {
        Self {
            distance: 0.30,
            experience: 0.20,
            rating: 0.30,
            personality: 0.20,
        }
    }
}

fn validate_weights(weights: &PreferenceWeights) -> Result<(), ValidationError> {
    if weights.is_valid() {
        Ok(())
    } else {
        Err(ValidationError::new("weights_must_be_non_negative"))
    }
}

/// Parent-side actor of a ranking call
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    #[validate(custom(function = "validate_weights"))]
    pub weights: PreferenceWeights,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0))]
    pub max_distance_km: Option<f64>,
    #[serde(default)]
    pub personality_traits: Option<TraitSet>,
}

/// Childminder row as the storage layer hands it over
///
/// Tag columns are kept as raw JSON; `Candidate::from_record` validates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub ratings: Vec<i32>,
    #[serde(default)]
    pub personality_traits: Option<Value>,
    #[serde(default)]
    pub specialized_care: Option<Value>,
    #[serde(default)]
    pub last_minute: bool,
    #[serde(default)]
    pub id_verified: bool,
    #[serde(default)]
    pub background_checked: bool,
}

impl CandidateRecord {
    /// Both verification attestations present
    pub fn is_verified(&self) -> bool {
        self.id_verified && self.background_checked
    }
}

/// Childminder-side actor eligible for ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub bio: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub experience: Option<String>,
    pub hourly_rate: Option<f64>,
    pub ratings: Vec<u8>,
    pub personality_traits: TraitSet,
    pub specialized_care: BTreeSet<CareSpecialty>,
    pub last_minute: bool,
}

impl Candidate {
    /// Validate a storage record into a typed candidate.
    ///
    /// Never fails: bad tag data becomes an empty set and ratings outside
    /// 1..=5 are dropped.
    pub fn from_record(record: CandidateRecord) -> Self {
        let personality_traits: TraitSet = record
            .personality_traits
            .as_ref()
            .map(|raw| parse_tag_list(raw, "personalityTraits", &record.id))
            .unwrap_or_default();
        let specialized_care: BTreeSet<CareSpecialty> = record
            .specialized_care
            .as_ref()
            .map(|raw| parse_tag_list(raw, "specializedCare", &record.id))
            .unwrap_or_default();

        let total_ratings = record.ratings.len();
        let ratings: Vec<u8> = record
            .ratings
            .into_iter()
            .filter_map(|r| u8::try_from(r).ok())
            .filter(|r| (1..=5).contains(r))
            .collect();
        if ratings.len() != total_ratings {
            tracing::warn!(
                "Dropped {} out-of-range ratings for {}",
                total_ratings - ratings.len(),
                record.id
            );
        }

        Self {
            coordinate: Coordinate::from_parts(record.latitude, record.longitude),
            id: record.id,
            name: record.name,
            bio: record.bio,
            experience: record.experience,
            hourly_rate: record.hourly_rate,
            ratings,
            personality_traits,
            specialized_care,
            last_minute: record.last_minute,
        }
    }

    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let total: u32 = self.ratings.iter().map(|&r| u32::from(r)).sum();
        Some(f64::from(total) / self.ratings.len() as f64)
    }
}

/// Sub-scores that had something to score and a non-zero weight
///
/// A computed distance fires even when it contributes 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredSubScores {
    pub distance: bool,
    pub experience: bool,
    pub rating: bool,
    pub personality: bool,
}

impl FiredSubScores {
    pub fn any(&self) -> bool {
        self.distance || self.experience || self.rating || self.personality
    }
}

/// Weighted contribution of each sub-score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub distance: f64,
    pub experience: f64,
    pub rating: f64,
    pub personality: f64,
    pub fired: FiredSubScores,
    /// Set when no sub-score fired and the baseline was assigned
    pub baseline: bool,
}

impl ScoreBreakdown {
    pub fn weighted_sum(&self) -> f64 {
        self.distance + self.experience + self.rating + self.personality
    }
}

/// Ranked candidate summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub id: String,
    pub name: String,
    pub bio: Option<String>,
    pub experience: Option<String>,
    pub hourly_rate: Option<f64>,
    pub average_rating: Option<f64>,
    pub review_count: usize,
    pub personality_traits: Vec<PersonalityTrait>,
    pub specialized_care: Vec<CareSpecialty>,
    pub last_minute: bool,
    /// Kilometres from the requester, `None` when either side has no coordinate
    #[serde(rename = "distance")]
    pub distance_km: Option<f64>,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl ScoredCandidate {
    pub fn new(
        candidate: Candidate,
        distance_km: Option<f64>,
        score: f64,
        breakdown: ScoreBreakdown,
    ) -> Self {
        let average_rating = candidate.average_rating();
        Self {
            review_count: candidate.ratings.len(),
            average_rating,
            id: candidate.id,
            name: candidate.name,
            bio: candidate.bio,
            experience: candidate.experience,
            hourly_rate: candidate.hourly_rate,
            personality_traits: candidate.personality_traits.into_iter().collect(),
            specialized_care: candidate.specialized_care.into_iter().collect(),
            last_minute: candidate.last_minute,
            distance_km,
            score,
            breakdown,
        }
    }
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Longitude range leaves [-180, 180]; a plain range check would miss wrapped points
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon < -180.0 || self.max_lon > 180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(traits: Value) -> CandidateRecord {
        CandidateRecord {
            id: "cm_1".to_string(),
            name: "Aoife".to_string(),
            bio: None,
            latitude: Some(53.35),
            longitude: Some(-6.26),
            experience: Some("6 years".to_string()),
            hourly_rate: Some(12.5),
            ratings: vec![4, 5, 9, 0],
            personality_traits: Some(traits),
            specialized_care: Some(json!(["infants", "school-pickup", "juggling"])),
            last_minute: true,
            id_verified: true,
            background_checked: true,
        }
    }

    #[test]
    fn test_trait_parsing_normalizes() {
        assert_eq!("Patient".parse::<PersonalityTrait>(), Ok(PersonalityTrait::Patient));
        assert_eq!("organized".parse::<PersonalityTrait>(), Ok(PersonalityTrait::Organised));
        assert_eq!(" special needs ".parse::<CareSpecialty>(), Ok(CareSpecialty::SpecialNeeds));
        assert!("grumpy".parse::<PersonalityTrait>().is_err());
    }

    #[test]
    fn test_from_record_parses_tags_and_ratings() {
        let candidate = Candidate::from_record(record(json!(["patient", "calm", 7, "grumpy"])));

        assert_eq!(
            candidate.personality_traits,
            BTreeSet::from([PersonalityTrait::Patient, PersonalityTrait::Calm])
        );
        assert_eq!(
            candidate.specialized_care,
            BTreeSet::from([CareSpecialty::Infants, CareSpecialty::SchoolPickup])
        );
        assert_eq!(candidate.ratings, vec![4, 5]);
        assert_eq!(candidate.average_rating(), Some(4.5));
        assert!(candidate.coordinate.is_some());
    }

    #[test]
    fn test_from_record_accepts_string_encoded_array() {
        let candidate = Candidate::from_record(record(json!("[\"playful\",\"musical\"]")));
        assert_eq!(candidate.personality_traits.len(), 2);
    }

    #[test]
    fn test_malformed_traits_become_empty() {
        for raw in [json!({"patient": true}), json!("not json"), json!(42), json!("{\"a\":1}")] {
            let candidate = Candidate::from_record(record(raw));
            assert!(candidate.personality_traits.is_empty());
        }
    }

    #[test]
    fn test_coordinate_requires_both_parts() {
        assert!(Coordinate::from_parts(Some(53.0), None).is_none());
        assert!(Coordinate::from_parts(Some(91.0), Some(0.0)).is_none());
        assert!(Coordinate::from_parts(Some(f64::NAN), Some(0.0)).is_none());
        assert!(Coordinate::from_parts(Some(53.0), Some(-6.0)).is_some());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = PreferenceWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert!(weights.is_valid());
    }

    #[test]
    fn test_requester_validation_rejects_negative_weight() {
        let requester = Requester {
            id: "parent".to_string(),
            coordinate: None,
            weights: PreferenceWeights {
                distance: -1.0,
                ..PreferenceWeights::default()
            },
            max_distance_km: None,
            personality_traits: None,
        };
        assert!(requester.validate().is_err());
    }
}
