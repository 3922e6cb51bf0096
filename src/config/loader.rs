//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{AppConfig, Backend};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment variable {name}: '{value}'")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `HOST`, `PORT`, `RATE_LIMIT`, `RATE_WINDOW`, `REDIS_URL` and `CATALOG_PATH`.
///
/// `REDIS_URL` switches both the limiter and the cache to the Redis backend.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("HOST");
    let port = lookup("PORT");
    if host.is_some() || port.is_some() {
        let (default_host, default_port) = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(h, p)| (h.to_string(), p.to_string()))
            .unwrap_or_else(|| ("0.0.0.0".to_string(), "8080".to_string()));
        let port = match port {
            Some(p) => {
                p.parse::<u16>()
                    .map_err(|_| ConfigError::Env { name: "PORT", value: p.clone() })?;
                p
            }
            None => default_port,
        };
        config.listener.bind_address = format!("{}:{}", host.unwrap_or(default_host), port);
    }

    if let Some(v) = lookup("RATE_LIMIT") {
        config.rate_limit.limit = v
            .parse()
            .map_err(|_| ConfigError::Env { name: "RATE_LIMIT", value: v.clone() })?;
    }
    if let Some(v) = lookup("RATE_WINDOW") {
        config.rate_limit.window_secs = v
            .parse()
            .map_err(|_| ConfigError::Env { name: "RATE_WINDOW", value: v.clone() })?;
    }
    if let Some(url) = lookup("REDIS_URL").filter(|u| !u.is_empty()) {
        config.rate_limit.backend = Backend::Redis;
        config.rate_limit.redis_url = Some(url.clone());
        config.cache.backend = Backend::Redis;
        config.cache.redis_url = Some(url);
    }
    if let Some(path) = lookup("CATALOG_PATH") {
        config.catalog.path = path;
    }

    Ok(())
}
