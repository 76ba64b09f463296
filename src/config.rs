use crate::database::cache::DEFAULT_MAX_AGE_SECS;
use std::{env, fmt::Display, str::FromStr, time::Duration};
use tracing::{info, warn};

pub const DEFAULT_POSTGREST_URL: &str = "https://apinovo.softagon.app";
pub const DEFAULT_CACHE_DATABASE_URL: &str = "sqlite:analise-cache.db?mode=rwc";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {message}")]
    Invalid {
        key: &'static str,
        value: String,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub postgrest_url: String,
    pub cache_database_url: String,
    pub port: u16,
    pub cache_max_age: Duration,
    pub http_timeout: Duration,
    /// When set, cache invalidation requires `Authorization: Bearer <token>`.
    pub invalidate_token: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cache_max_age_secs: u64 = try_load(
            &lookup,
            "CACHE_MAX_AGE_SECS",
            &DEFAULT_MAX_AGE_SECS.to_string(),
        )?;
        let http_timeout_secs: u64 = try_load(&lookup, "HTTP_TIMEOUT_SECS", "30")?;

        Ok(Self {
            postgrest_url: try_load(&lookup, "POSTGREST_URL", DEFAULT_POSTGREST_URL)?,
            cache_database_url: try_load(
                &lookup,
                "CACHE_DATABASE_URL",
                DEFAULT_CACHE_DATABASE_URL,
            )?,
            port: try_load(&lookup, "PORT", "3000")?,
            cache_max_age: Duration::from_secs(cache_max_age_secs),
            http_timeout: Duration::from_secs(http_timeout_secs),
            invalidate_token: lookup("CACHE_INVALIDATE_TOKEN").filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn cache_max_age(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.cache_max_age)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_MAX_AGE_SECS))
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            message: e.to_string(),
            value,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(DEFAULT_POSTGREST_URL, config.postgrest_url);
        assert_eq!(DEFAULT_CACHE_DATABASE_URL, config.cache_database_url);
        assert_eq!(3000, config.port);
        assert_eq!(Duration::from_secs(30), config.http_timeout);
        assert_eq!(
            chrono::Duration::days(365),
            config.cache_max_age()
        );
        assert_eq!(None, config.invalidate_token);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("POSTGREST_URL", "http://localhost:3001"),
            ("PORT", "8080"),
            ("CACHE_MAX_AGE_SECS", "60"),
            ("CACHE_INVALIDATE_TOKEN", "segredo"),
        ])
        .unwrap();
        assert_eq!("http://localhost:3001", config.postgrest_url);
        assert_eq!(8080, config.port);
        assert_eq!(chrono::Duration::seconds(60), config.cache_max_age());
        assert_eq!(Some("segredo".to_string()), config.invalidate_token);
    }

    #[test]
    fn test_blank_token_is_unset() {
        let config = load(&[("CACHE_INVALIDATE_TOKEN", "  ")]).unwrap();
        assert_eq!(None, config.invalidate_token);
    }

    #[test]
    fn test_invalid_port() {
        assert!(matches!(
            load(&[("PORT", "abc")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
    }
}
