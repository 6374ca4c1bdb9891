use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
    pub auth: AuthConfig,
    pub otlp_endpoint: Option<String>,
}

/// Which repository serves notification reads.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    /// Process-local store, for local runs without a database.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid NOTIFICATION_STORE: {}. Must be one of: mongo, memory",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 shared secret. Ignored when `jwt_public_key_path` is set.
    pub jwt_secret: Option<Secret<String>>,
    /// RS256 public key (PEM) of the token issuer.
    pub jwt_public_key_path: Option<String>,
    /// Accept `X-User-ID` from a trusted gateway when no bearer token is sent.
    pub trust_user_header: bool,
}

impl NotificationConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let store: StoreBackend = get_env("NOTIFICATION_STORE", Some("mongo"), is_prod)?.parse()?;

        // Mongo settings are only mandatory when Mongo actually serves reads
        let require_mongo = is_prod && store == StoreBackend::Mongo;
        let mongo_uri_default = match store {
            StoreBackend::Mongo => None,
            StoreBackend::Memory => Some("mongodb://localhost:27017"),
        };

        let auth = AuthConfig {
            jwt_secret: env::var("AUTH_JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .map(Secret::new),
            jwt_public_key_path: env::var("AUTH_JWT_PUBLIC_KEY_PATH")
                .ok()
                .filter(|s| !s.is_empty()),
            trust_user_header: parse_flag(
                "AUTH_TRUST_USER_HEADER",
                &get_env("AUTH_TRUST_USER_HEADER", Some("false"), false)?,
            )?,
        };

        if auth.jwt_secret.is_none() && auth.jwt_public_key_path.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "One of AUTH_JWT_PUBLIC_KEY_PATH or AUTH_JWT_SECRET must be set"
            )));
        }

        Ok(NotificationConfig {
            common: core_config::Config {
                log_level: env::var("LOG_LEVEL").unwrap_or(common_config.log_level),
                ..common_config
            },
            store,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", mongo_uri_default, require_mongo)?,
                database: get_env("MONGODB_DATABASE", Some("notification_db"), require_mongo)?,
            },
            auth,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(AppError::ConfigError(anyhow::anyhow!(
            "Invalid {}: {}. Must be true or false",
            key,
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_known_values() {
        assert_eq!("mongo".parse::<StoreBackend>().unwrap(), StoreBackend::Mongo);
        assert_eq!("MongoDB".parse::<StoreBackend>().unwrap(), StoreBackend::Mongo);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn parse_flag_accepts_booleans() {
        assert!(parse_flag("AUTH_TRUST_USER_HEADER", "true").unwrap());
        assert!(parse_flag("AUTH_TRUST_USER_HEADER", "TRUE").unwrap());
        assert!(parse_flag("AUTH_TRUST_USER_HEADER", "1").unwrap());
        assert!(!parse_flag("AUTH_TRUST_USER_HEADER", "false").unwrap());
        assert!(!parse_flag("AUTH_TRUST_USER_HEADER", "").unwrap());
    }

    #[test]
    fn parse_flag_rejects_unknown_values() {
        assert!(matches!(
            parse_flag("AUTH_TRUST_USER_HEADER", "yes"),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn get_env_falls_back_to_default_outside_prod() {
        let value = get_env("NOTIFICATION_TEST_UNSET_KEY", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn get_env_requires_value_in_prod() {
        assert!(get_env("NOTIFICATION_TEST_UNSET_KEY", Some("fallback"), true).is_err());
    }
}
