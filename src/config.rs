use crate::engine::RatingPolicy;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub sweep_interval: Duration,
    pub pending_expiry: Duration,
    pub rating_policy: RatingPolicy,
    /// `None` allows any origin.
    pub cors_allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), expected.to_string())),
    }
}

fn positive_secs(
    env_map: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs = parse_or(env_map, key, default, "must be a positive integer of seconds")?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", 8080u16, "must be a valid u16")?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let sweep_interval = positive_secs(&env_map, "SWEEP_INTERVAL_SECS", 3600)?;
        let pending_expiry = positive_secs(&env_map, "PENDING_EXPIRY_SECS", 86_400)?;

        let rating_policy = match env_map.get("RATING_FLOOR").map(|s| s.trim()) {
            None | Some("") => RatingPolicy::unbounded(),
            Some(raw) => {
                let floor = raw.parse::<f64>().ok().filter(|f| f.is_finite()).ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "RATING_FLOOR".to_string(),
                        "must be a finite number".to_string(),
                    )
                })?;
                RatingPolicy::with_floor(floor)
            }
        };

        let cors_allowed_origins = env_map.get("CORS_ALLOWED_ORIGINS").and_then(|raw| {
            let origins: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && s != "*")
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        });

        Ok(Config {
            port,
            database_path,
            sweep_interval,
            pending_expiry,
            rating_policy,
            cors_allowed_origins,
        })
    }
}
