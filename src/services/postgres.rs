use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseSettings;
use crate::core::calculate_bounding_box;
use crate::models::domain::parse_tag_list;
use crate::models::{
    BoundingBox, CandidateRecord, Coordinate, MatchRequest, PreferenceWeights, Requester,
};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Parameters of the candidate pool query
#[derive(Debug, Clone, Default)]
pub struct PoolQuery {
    /// Requester location; when set, the row cap keeps the nearest candidates
    pub center: Option<Coordinate>,
    /// Pre-filter on coordinates; rows without a coordinate always pass
    pub bounding_box: Option<BoundingBox>,
    /// Only childminders who accept last-minute bookings
    pub last_minute_only: bool,
    pub limit: u32,
}

impl PoolQuery {
    /// Build the pool query for one ranking call
    ///
    /// The request's distance bound wins over the requester's stored one, as
    /// it does in the matcher.
    pub fn for_requester(requester: &Requester, filters: &MatchRequest, limit: u32) -> Self {
        let max_distance = filters.max_distance.or(requester.max_distance_km);

        Self {
            center: requester.coordinate,
            bounding_box: requester
                .coordinate
                .zip(max_distance)
                .map(|(center, radius)| calculate_bounding_box(center, radius)),
            last_minute_only: filters.last_minute == Some(true),
            limit,
        }
    }

    /// Whether a result of `fetched` rows may have been cut by the row cap
    pub fn is_truncated(&self, fetched: usize) -> bool {
        fetched >= self.limit as usize
    }
}

/// PostgreSQL client for the profile store
///
/// Read-only: profiles, reviews and verification flags are owned by the
/// marketplace application. Constructed once in `main` and injected into the
/// handlers through `AppState`.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool_options(settings: &DatabaseSettings) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(settings.max_connections.unwrap_or(10))
            .min_connections(settings.min_connections.unwrap_or(1))
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)))
            .idle_timeout(Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)))
            .test_before_acquire(true)
    }

    /// Connect eagerly, failing if the database is unreachable
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, PostgresError> {
        tracing::info!(
            "Connecting to PostgreSQL (max: {} connections)",
            settings.max_connections.unwrap_or(10)
        );

        let pool = Self::pool_options(settings).connect(&settings.url).await?;
        Ok(Self { pool })
    }

    /// Build a client whose connections are opened on first use
    pub fn connect_lazy(settings: &DatabaseSettings) -> Result<Self, PostgresError> {
        let pool = Self::pool_options(settings).connect_lazy(&settings.url)?;
        Ok(Self { pool })
    }

    /// Load a parent's matching profile
    ///
    /// Weight columns left NULL fall back to `default_weights`.
    pub async fn get_requester(
        &self,
        user_id: &str,
        default_weights: &PreferenceWeights,
    ) -> Result<Requester, PostgresError> {
        let query = r#"
            SELECT user_id,
                   latitude::float8 AS latitude,
                   longitude::float8 AS longitude,
                   weight_distance::float8 AS weight_distance,
                   weight_experience::float8 AS weight_experience,
                   weight_rating::float8 AS weight_rating,
                   weight_personality::float8 AS weight_personality,
                   max_distance_km::float8 AS max_distance_km,
                   personality_traits
            FROM parent_profiles
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("Parent profile not found for user {}", user_id)))?;

        let requester = requester_from_row(&row, default_weights)?;

        tracing::debug!(
            "Loaded requester {} (coordinate: {}, max distance: {:?})",
            requester.id,
            requester.coordinate.is_some(),
            requester.max_distance_km
        );

        Ok(requester)
    }

    /// Fetch the verified childminder pool
    ///
    /// Both verification flags are required here; the matcher never sees an
    /// unverified childminder. Ratings are aggregated from reviews. Rows are
    /// ordered nearest first (unknown coordinates last) so the row cap drops
    /// the farthest candidates.
    pub async fn fetch_candidate_pool(
        &self,
        query: &PoolQuery,
    ) -> Result<Vec<CandidateRecord>, PostgresError> {
        let sql = r#"
            SELECT c.user_id,
                   c.name,
                   c.bio,
                   c.latitude::float8 AS latitude,
                   c.longitude::float8 AS longitude,
                   c.experience,
                   c.hourly_rate::float8 AS hourly_rate,
                   c.personality_traits,
                   c.specialized_care,
                   c.last_minute,
                   c.id_verified,
                   c.background_checked,
                   COALESCE(
                       ARRAY_AGG(r.rating::int4) FILTER (WHERE r.rating IS NOT NULL),
                       '{}'
                   ) AS ratings
            FROM childminder_profiles c
            LEFT JOIN reviews r ON r.childminder_id = c.user_id
            WHERE c.id_verified AND c.background_checked
              AND ($1::float8 IS NULL OR c.latitude IS NULL OR c.longitude IS NULL
                   OR c.latitude BETWEEN $1 AND $2)
              AND ($3::float8 IS NULL OR c.latitude IS NULL OR c.longitude IS NULL
                   OR c.longitude BETWEEN $3 AND $4)
              AND (NOT $5 OR c.last_minute)
            GROUP BY c.user_id
            ORDER BY (c.latitude IS NULL OR c.longitude IS NULL OR $7::float8 IS NULL),
                     POWER(c.latitude - $7, 2)
                       + POWER(LEAST(ABS(c.longitude - $8::float8), 360 - ABS(c.longitude - $8::float8))
                               * COS(RADIANS($7)), 2),
                     c.user_id
            LIMIT $6
        "#;

        let bbox = query.bounding_box;
        let (min_lat, max_lat) = bbox.map(|b| (b.min_lat, b.max_lat)).unzip();
        // A wrapped longitude range cannot be expressed as one BETWEEN
        let (min_lon, max_lon) = bbox
            .filter(|b| !b.crosses_antimeridian())
            .map(|b| (b.min_lon, b.max_lon))
            .unzip();

        let rows = sqlx::query(sql)
            .bind(min_lat)
            .bind(max_lat)
            .bind(min_lon)
            .bind(max_lon)
            .bind(query.last_minute_only)
            .bind(i64::from(query.limit))
            .bind(query.center.map(|c| c.latitude))
            .bind(query.center.map(|c| c.longitude))
            .fetch_all(&self.pool)
            .await?;

        if query.is_truncated(rows.len()) {
            tracing::warn!(
                "Candidate pool hit the cap of {} rows; only the nearest were fetched",
                query.limit
            );
        }

        let records = rows
            .iter()
            .map(candidate_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Fetched {} candidate records", records.len());

        Ok(records)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn requester_from_row(row: &PgRow, default_weights: &PreferenceWeights) -> Result<Requester, sqlx::Error> {
    let id: String = row.try_get("user_id")?;
    let traits: Option<Value> = row.try_get("personality_traits")?;

    let weights = PreferenceWeights {
        distance: row
            .try_get::<Option<f64>, _>("weight_distance")?
            .unwrap_or(default_weights.distance),
        experience: row
            .try_get::<Option<f64>, _>("weight_experience")?
            .unwrap_or(default_weights.experience),
        rating: row
            .try_get::<Option<f64>, _>("weight_rating")?
            .unwrap_or(default_weights.rating),
        personality: row
            .try_get::<Option<f64>, _>("weight_personality")?
            .unwrap_or(default_weights.personality),
    };
    let weights = if weights.is_valid() {
        weights
    } else {
        tracing::warn!("Stored weights for {} are invalid, using defaults", id);
        *default_weights
    };

    let max_distance_km = row
        .try_get::<Option<f64>, _>("max_distance_km")?
        .filter(|d| *d > 0.0);

    Ok(Requester {
        coordinate: Coordinate::from_parts(row.try_get("latitude")?, row.try_get("longitude")?),
        weights,
        max_distance_km,
        personality_traits: traits
            .as_ref()
            .map(|raw| parse_tag_list(raw, "personalityTraits", &id)),
        id,
    })
}

fn candidate_from_row(row: &PgRow) -> Result<CandidateRecord, sqlx::Error> {
    Ok(CandidateRecord {
        id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        bio: row.try_get("bio")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        experience: row.try_get("experience")?,
        hourly_rate: row.try_get("hourly_rate")?,
        ratings: row.try_get("ratings")?,
        personality_traits: row.try_get("personality_traits")?,
        specialized_care: row.try_get("specialized_care")?,
        last_minute: row.try_get("last_minute")?,
        id_verified: row.try_get("id_verified")?,
        background_checked: row.try_get("background_checked")?,
    })
}
