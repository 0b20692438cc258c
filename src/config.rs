use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::MatchingConfig;
use crate::models::PreferenceWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

/// Sample secrets that must never verify real tokens
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "changeme", "secret", "your-secret"];

/// Session token verification for the auth provider
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub jwt_secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    pub default_limit: Option<u16>,
    pub max_limit: Option<u16>,
    /// Row cap on the candidate pool query
    pub pool_limit: Option<u32>,
    #[serde(default = "default_baseline_score")]
    pub baseline_score: f64,
    #[serde(default = "default_experience_cap_years")]
    pub experience_cap_years: f64,
    #[serde(default = "default_reference_radius_km")]
    pub reference_radius_km: f64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_limit: None,
            max_limit: None,
            pool_limit: None,
            baseline_score: default_baseline_score(),
            experience_cap_years: default_experience_cap_years(),
            reference_radius_km: default_reference_radius_km(),
        }
    }
}

impl MatchingSettings {
    pub fn to_matching_config(&self) -> MatchingConfig {
        MatchingConfig {
            baseline_score: self.baseline_score,
            experience_cap_years: self.experience_cap_years,
            reference_radius_km: self.reference_radius_km,
        }
    }
}

fn default_baseline_score() -> f64 { 0.5 }
fn default_experience_cap_years() -> f64 { 10.0 }
fn default_reference_radius_km() -> f64 { 25.0 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    /// Used for requesters who never stored their own weights
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_distance_weight")]
    pub distance: f64,
    #[serde(default = "default_experience_weight")]
    pub experience: f64,
    #[serde(default = "default_rating_weight")]
    pub rating: f64,
    #[serde(default = "default_personality_weight")]
    pub personality: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            distance: default_distance_weight(),
            experience: default_experience_weight(),
            rating: default_rating_weight(),
            personality: default_personality_weight(),
        }
    }
}

impl From<&WeightsConfig> for PreferenceWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            distance: config.distance,
            experience: config.experience,
            rating: config.rating,
            personality: config.personality,
        }
    }
}

fn default_distance_weight() -> f64 { 0.30 }
fn default_experience_weight() -> f64 { 0.20 }
fn default_rating_weight() -> f64 { 0.30 }
fn default_personality_weight() -> f64 { 0.20 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MINDER__)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MINDER__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("MINDER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MINDER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the matcher cannot work with
    ///
    /// Weights that do not sum to 1.0 are allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = self.default_weights();
        if !weights.is_valid() {
            return Err(ConfigError::Message(format!(
                "scoring.weights must be finite and non-negative, got {:?}",
                weights
            )));
        }

        let matching = &self.matching;
        if !(matching.experience_cap_years > 0.0) {
            return Err(ConfigError::Message(
                "matching.experience_cap_years must be positive".to_string(),
            ));
        }
        if !(matching.reference_radius_km > 0.0) {
            return Err(ConfigError::Message(
                "matching.reference_radius_km must be positive".to_string(),
            ));
        }
        if !matching.baseline_score.is_finite() {
            return Err(ConfigError::Message(
                "matching.baseline_score must be finite".to_string(),
            ));
        }
        let secret = self.auth.jwt_secret.trim();
        if secret.is_empty() {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be set (MINDER_JWT_SECRET)".to_string(),
            ));
        }
        if PLACEHOLDER_SECRETS.contains(&secret.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Message(format!(
                "auth.jwt_secret is the placeholder {:?}",
                secret
            )));
        }

        Ok(())
    }

    pub fn default_weights(&self) -> PreferenceWeights {
        PreferenceWeights::from(&self.scoring.weights)
    }
}

/// Apply well-known environment variables that do not follow the MINDER__ scheme
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    // DATABASE_URL first, then MINDER__DATABASE__URL (already merged above)
    let database_url = env::var("DATABASE_URL").ok();
    let jwt_secret = env::var("MINDER_JWT_SECRET").ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = database_url {
        builder = builder.set_override("database.url", url)?;
    }
    if let Some(secret) = jwt_secret {
        builder = builder.set_override("auth.jwt_secret", secret)?;
    }

    builder.build()
}
