use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use minder_match::config::{LoggingSettings, Settings};
use minder_match::core::Matcher;
use minder_match::error::handle_json_payload_error;
use minder_match::routes::{self, matches::{AppState, MatchLimits}};
use minder_match::services::{PostgresClient, SessionVerifier};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("Configuration error: {}", e))
    })?;

    init_tracing(&settings.logging);

    info!("Starting Minder Match service...");

    let postgres = Arc::new(
        PostgresClient::from_settings(&settings.database)
            .await
            .map_err(|e| std::io::Error::other(format!("PostgreSQL connection error: {}", e)))?,
    );

    info!("PostgreSQL client initialized");

    let identity = Arc::new(SessionVerifier::new(&settings.auth));

    let matching_config = settings.matching.to_matching_config();
    let matcher = Matcher::new(matching_config);
    let default_weights = settings.default_weights();
    if (default_weights.sum() - 1.0).abs() > 1e-6 {
        warn!("scoring.weights sum to {}, scores may exceed 1.0", default_weights.sum());
    }

    info!(
        "Matcher initialized with {:?}, default weights: {:?}",
        matching_config, default_weights
    );

    let defaults = MatchLimits::default();
    let limits = MatchLimits {
        default_limit: settings.matching.default_limit.unwrap_or(defaults.default_limit),
        max_limit: settings.matching.max_limit.unwrap_or(defaults.max_limit),
        pool_limit: settings.matching.pool_limit.unwrap_or(defaults.pool_limit),
    };

    let app_state = AppState {
        postgres,
        identity,
        matcher,
        default_weights,
        limits,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
