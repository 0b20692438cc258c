use crate::models::{Candidate, FiredSubScores, PreferenceWeights, ScoreBreakdown, TraitSet};

/// Highest value on the review scale
const MAX_RATING: f64 = 5.0;

/// Inputs to a single candidate's composite score that do not depend on the candidate
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub weights: &'a PreferenceWeights,
    /// Radius the distance sub-score is normalised against
    pub radius_km: f64,
    pub requested_traits: &'a TraitSet,
    pub experience_cap_years: f64,
    pub baseline_score: f64,
}

/// Calculate the composite score for a candidate
///
/// score = distance_score * w.distance
///       + experience_score * w.experience
///       + rating_score * w.rating
///       + personality_score * w.personality
///
/// A sub-score fires when it has an input (a known distance, a number in the
/// experience text, at least one rating, at least one shared trait) and a
/// non-zero weight. The baseline replaces the sum only when nothing fired, so
/// a computed distance that scores 0.0 stays a real zero. The result is not
/// clamped.
pub fn calculate_match_score(
    candidate: &Candidate,
    distance_km: Option<f64>,
    ctx: &ScoringContext<'_>,
) -> (f64, ScoreBreakdown) {
    let weights = ctx.weights;
    let years = candidate.experience.as_deref().and_then(parse_experience_years);
    let shared_traits = ctx
        .requested_traits
        .intersection(&candidate.personality_traits)
        .count();

    let fired = FiredSubScores {
        distance: distance_km.is_some() && weights.distance > 0.0,
        experience: years.is_some() && weights.experience > 0.0,
        rating: !candidate.ratings.is_empty() && weights.rating > 0.0,
        personality: shared_traits > 0 && weights.personality > 0.0,
    };

    let mut breakdown = ScoreBreakdown {
        distance: distance_km
            .map(|d| distance_score(d, ctx.radius_km) * weights.distance)
            .unwrap_or(0.0),
        experience: experience_score(candidate.experience.as_deref(), ctx.experience_cap_years)
            * weights.experience,
        rating: rating_score(&candidate.ratings) * weights.rating,
        personality: personality_score(ctx.requested_traits, &candidate.personality_traits)
            * weights.personality,
        fired,
        baseline: false,
    };

    if !fired.any() {
        breakdown.baseline = true;
        return (ctx.baseline_score, breakdown);
    }

    (breakdown.weighted_sum(), breakdown)
}

/// Distance sub-score (0-1), linear falloff to zero at the radius
#[inline]
pub fn distance_score(distance_km: f64, radius_km: f64) -> f64 {
    if !(radius_km > 0.0) || !distance_km.is_finite() {
        return 0.0;
    }
    (1.0 - distance_km / radius_km).max(0.0)
}

/// Best-effort years of experience from free text
///
/// Takes the first number in the text ("5 years", "over 2.5 yrs"); `None`
/// when there is none.
pub fn parse_experience_years(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];

    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in rest.char_indices() {
        if c.is_ascii_digit() {
            end = i + 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
    }

    rest[..end].parse::<f64>().ok()
}

/// Experience sub-score (0-1), capped at `cap_years`
#[inline]
pub fn experience_score(experience: Option<&str>, cap_years: f64) -> f64 {
    if !(cap_years > 0.0) {
        return 0.0;
    }
    let years = experience.and_then(parse_experience_years).unwrap_or(0.0);
    (years / cap_years).min(1.0)
}

/// Rating sub-score (0-1): mean rating over the 5-point scale
#[inline]
pub fn rating_score(ratings: &[u8]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let total: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
    f64::from(total) / ratings.len() as f64 / MAX_RATING
}

/// Personality sub-score (0-1): share of requested traits the candidate has
///
/// Nothing requested means nothing to score, not full credit.
#[inline]
pub fn personality_score(requested: &TraitSet, candidate: &TraitSet) -> f64 {
    if requested.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    let shared = requested.intersection(candidate).count();
    shared as f64 / requested.len() as f64
}
