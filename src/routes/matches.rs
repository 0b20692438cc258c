use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{assemble_pool, Matcher};
use crate::error::ApiError;
use crate::models::{
    HealthResponse, PreferenceWeights, PreviewMatchesRequest, RankMatchesRequest,
    RankMatchesResponse,
};
use crate::services::{PoolQuery, PostgresClient, Role, SessionVerifier};

/// Result size limits for the ranking endpoints
#[derive(Debug, Clone, Copy)]
pub struct MatchLimits {
    pub default_limit: u16,
    pub max_limit: u16,
    pub pool_limit: u32,
}

impl MatchLimits {
    /// Cap a requested limit at the configured maximum
    pub fn resolve(&self, requested: Option<u16>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit) as usize
    }
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            pool_limit: 500,
        }
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub identity: Arc<SessionVerifier>,
    pub matcher: Matcher,
    /// Weights for parents who never stored their own
    pub default_weights: PreferenceWeights,
    pub limits: MatchLimits,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/rank", web::post().to(rank_matches))
        .route("/matches/preview", web::post().to(preview_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Rank childminders for the authenticated parent
///
/// POST /api/v1/matches/rank
///
/// Request body:
/// ```json
/// {
///   "limit": 20,
///   "maxDistance": 10.0,
///   "personalityTraits": ["patient", "playful"],
///   "specializedCare": ["infants"],
///   "lastMinute": false
/// }
/// ```
async fn rank_matches(
    state: web::Data<AppState>,
    req: web::Json<RankMatchesRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let auth_header = http_req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let claims = state.identity.verify_header(auth_header)?;
    if claims.role != Role::Parent {
        return Err(ApiError::Forbidden(format!(
            "Only parents can request matches, caller is {:?}",
            claims.role
        )));
    }

    req.validate()?;
    let body = req.into_inner();
    let limit = state.limits.resolve(body.limit);
    let filters = body.filters;

    tracing::info!("Ranking matches for parent: {}, limit: {}", claims.sub, limit);

    let requester = state
        .postgres
        .get_requester(&claims.sub, &state.default_weights)
        .await?;

    let query = PoolQuery::for_requester(&requester, &filters, state.limits.pool_limit);

    let records = state.postgres.fetch_candidate_pool(&query).await?;
    let candidates = assemble_pool(records, &filters);

    let result = state
        .matcher
        .find_matches(&requester, candidates, &filters, limit);

    tracing::info!(
        "Returning {} matches for parent {} (from {} candidates, {} out of range)",
        result.matches.len(),
        claims.sub,
        result.total_candidates,
        result.excluded
    );

    Ok(HttpResponse::Ok().json(RankMatchesResponse::from(result)))
}

/// Rank a caller-supplied pool without touching storage
///
/// POST /api/v1/matches/preview
async fn preview_matches(
    state: web::Data<AppState>,
    req: web::Json<PreviewMatchesRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let body = req.into_inner();
    let limit = state.limits.resolve(body.limit);

    let candidates = assemble_pool(body.candidates, &body.request);
    let result = state
        .matcher
        .find_matches(&body.requester, candidates, &body.request, limit);

    tracing::debug!(
        "Preview for {} returned {} matches",
        body.requester.id,
        result.matches.len()
    );

    Ok(HttpResponse::Ok().json(RankMatchesResponse::from(result)))
}
