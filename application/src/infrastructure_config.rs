use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use domain::entitlement::EntitlementPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub ledger: LedgerConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: SecretString,
    pub pool_size: u32,
    pub query_timeout_secs: u64,
}

impl Serialize for DbConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("DbConfig", 3)?;
        state.serialize_field("database_url", "[REDACTED]")?;
        state.serialize_field("pool_size", &self.pool_size)?;
        state.serialize_field("query_timeout_secs", &self.query_timeout_secs)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for DbConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct DbConfigHelper {
            database_url: String,
            pool_size: u32,
            query_timeout_secs: u64,
        }

        let helper = DbConfigHelper::deserialize(deserializer)?;
        Ok(DbConfig {
            database_url: SecretString::from(helper.database_url),
            pool_size: helper.pool_size,
            query_timeout_secs: helper.query_timeout_secs,
        })
    }
}

impl DbConfig {
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let url_str = self.database_url.expose_secret();
        match url::Url::parse(url_str) {
            Ok(mut url) => {
                if url.password().is_some() {
                    url.set_password(Some("***")).ok();
                }
                url.to_string()
            }
            Err(_) => "[INVALID_URL]".to_string(),
        }
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        self.database_url.expose_secret()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerBackend {
    #[serde(rename = "postgres")]
    Postgres,
    #[serde(rename = "memory")]
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    pub signup_free_downloads: i32,
    pub max_batch_quantity: i32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub download_requests_per_minute: u32,
    pub purchase_requests_per_minute: u32,
    pub global_requests_per_minute: u32,
    pub burst_size_multiplier: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_location: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "pretty")]
    Pretty,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_origin: None,
            },
            db: DbConfig {
                database_url: SecretString::from("postgresql://localhost/resume_builder"),
                pool_size: 10,
                query_timeout_secs: 5,
            },
            ledger: LedgerConfig {
                backend: LedgerBackend::Postgres,
                signup_free_downloads: 1,
                max_batch_quantity: 1000,
                run_migrations: true,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                download_requests_per_minute: 30,
                purchase_requests_per_minute: 10,
                global_requests_per_minute: 600,
                burst_size_multiplier: 2,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: false,
            },
            environment: EnvironmentConfig {
                env: "development".to_string(),
            },
        }
    }
}

impl Config {
    pub fn validate(&self) -> AppResult<()> {
        if self.ledger.backend == LedgerBackend::Postgres {
            if self.db.database_url.expose_secret().is_empty() {
                return Err(AppError::ConfigError {
                    message: "database_url cannot be empty".to_string(),
                });
            }

            if self.db.pool_size == 0 {
                return Err(AppError::ConfigError {
                    message: "db pool_size must be greater than 0".to_string(),
                });
            }

            if self.db.query_timeout_secs == 0 {
                return Err(AppError::ConfigError {
                    message: "db query_timeout_secs must be greater than 0".to_string(),
                });
            }
        }

        self.entitlement_policy()?;

        if self.rate_limit.enabled {
            if self.rate_limit.download_requests_per_minute == 0
                || self.rate_limit.purchase_requests_per_minute == 0
                || self.rate_limit.global_requests_per_minute == 0
            {
                return Err(AppError::ConfigError {
                    message: "Rate limit values must be greater than 0 when enabled".to_string(),
                });
            }

            if self.rate_limit.burst_size_multiplier == 0 {
                return Err(AppError::ConfigError {
                    message: "burst_size_multiplier must be greater than 0".to_string(),
                });
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "logging level cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn entitlement_policy(&self) -> AppResult<EntitlementPolicy> {
        EntitlementPolicy::new(
            self.ledger.signup_free_downloads,
            self.ledger.max_batch_quantity,
        )
        .map_err(|e| AppError::ConfigError {
            message: e.to_string(),
        })
    }

    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn negative_signup_bonus_is_rejected() {
        let mut config = Config::default();
        config.ledger.signup_free_downloads = -1;

        assert!(matches!(
            config.validate(),
            Err(AppError::ConfigError { .. })
        ));
    }

    #[test]
    fn rate_limits_are_only_checked_when_enabled() {
        let mut config = Config::default();
        config.rate_limit.download_requests_per_minute = 0;
        assert!(config.validate().is_err());

        config.rate_limit.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn memory_backend_ignores_database_settings() {
        let mut config = Config::default();
        config.db.pool_size = 0;
        assert!(config.validate().is_err());

        config.ledger.backend = LedgerBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn database_url_is_redacted() {
        let mut config = Config::default();
        config.db.database_url = SecretString::from("postgresql://app:hunter2@db:5432/resume");

        assert_eq!(config.db.redacted_url(), "postgresql://app:***@db:5432/resume");

        let serialized = serde_json::to_value(&config.db).unwrap();
        assert_eq!(serialized["database_url"], "[REDACTED]");
        assert_eq!(serialized["pool_size"], 10);
    }
}
