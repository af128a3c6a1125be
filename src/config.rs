use std::env;
use std::fmt;

use secrecy::Secret;

use crate::expense::filter::{DateRangePolicy, InputPolicy, QueryPolicy};

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, reason } => write!(f, "Invalid {key}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Server settings read from the environment at startup
#[derive(Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: Secret<String>,
    pub allowed_origins: String,
    pub host: String,
    pub port: u16,
    pub query_policy: QueryPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let date_range = match get("EXPENSE_DATE_RANGE_POLICY") {
            Some(raw) => raw
                .parse::<DateRangePolicy>()
                .map_err(|reason| ConfigError::Invalid {
                    key: "EXPENSE_DATE_RANGE_POLICY",
                    reason,
                })?,
            None => DateRangePolicy::default(),
        };

        let input = match get("EXPENSE_INPUT_POLICY") {
            Some(raw) => raw
                .parse::<InputPolicy>()
                .map_err(|reason| ConfigError::Invalid {
                    key: "EXPENSE_INPUT_POLICY",
                    reason,
                })?,
            None => InputPolicy::default(),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: Secret::new(required("JWT_SECRET")?),
            allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            query_policy: QueryPolicy { date_range, input },
        })
    }

    /// Whether `origin` is on the comma-separated CORS allow list
    pub fn is_origin_allowed(allowed_origins: &str, origin: &str) -> bool {
        allowed_origins
            .split(',')
            .any(|allowed| allowed.trim() == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/expenses"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.database_url, "postgres://localhost/expenses");
        assert_eq!(config.jwt_secret.expose_secret(), "secret");
        assert_eq!(config.allowed_origins, "http://localhost:5173");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.query_policy, QueryPolicy::default());
    }

    #[test]
    fn test_missing_required() {
        let err = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "s")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
        assert_eq!(err.to_string(), "DATABASE_URL must be set");

        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "  "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn test_policies_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("EXPENSE_DATE_RANGE_POLICY", "open-ended"));
        pairs.push(("EXPENSE_INPUT_POLICY", "strict"));

        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.query_policy.date_range, DateRangePolicy::OpenEnded);
        assert_eq!(config.query_policy.input, InputPolicy::Strict);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("EXPENSE_INPUT_POLICY", "paranoid"));

        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "EXPENSE_INPUT_POLICY", .. }
        ));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));

        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().starts_with("Invalid PORT"));
    }

    #[test]
    fn test_origin_allow_list() {
        let allowed = "http://localhost:5173, https://expenses.example.com";
        assert!(AppConfig::is_origin_allowed(allowed, "http://localhost:5173"));
        assert!(AppConfig::is_origin_allowed(allowed, "https://expenses.example.com"));
        assert!(!AppConfig::is_origin_allowed(allowed, "https://evil.example.com"));
    }
}
