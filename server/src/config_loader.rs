use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use resume_builder_application::error::{AppError, AppResult};
use resume_builder_application::infrastructure_config::Config;
use std::fs;
use std::path::Path;
use tracing::info;

pub const ENV_PREFIX: &str = "RESUME_BUILDER_";

/// Defaults, then `config.toml`, then `config.json`, then
/// `RESUME_BUILDER_*` variables (`__` separates nested keys, e.g.
/// `RESUME_BUILDER_LEDGER__BACKEND=memory`).
pub fn load_config() -> AppResult<Config> {
    generate_env_template_if_missing()?;

    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if Path::new("config.toml").exists() {
        figment = figment.merge(Toml::file("config.toml"));
    }

    if Path::new("config.json").exists() {
        figment = figment.merge(Json::file("config.json"));
    }

    extract_config(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

fn extract_config(figment: Figment) -> AppResult<Config> {
    let config: Config = figment.extract().map_err(|e| AppError::ConfigError {
        message: format!("Failed to load configuration: {e}"),
    })?;

    config.validate()?;
    Ok(config)
}

fn generate_env_template_if_missing() -> AppResult<()> {
    let env_file = ".env";
    let template_file = ".env.example";

    if Path::new(env_file).exists() || !Path::new(template_file).exists() {
        return Ok(());
    }

    fs::copy(template_file, env_file).map_err(|e| AppError::ConfigError {
        message: format!("Failed to generate .env file from template: {e}"),
    })?;

    info!("Generated .env from template. Set DATABASE_URL before starting against PostgreSQL.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use resume_builder_application::infrastructure_config::LedgerBackend;
    use serde_json::json;

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
    }

    #[test]
    fn defaults_extract_cleanly() {
        let config = extract_config(defaults()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.ledger.signup_free_downloads, 1);
        assert_eq!(config.ledger.backend, LedgerBackend::Postgres);
    }

    #[test]
    fn overrides_replace_nested_keys() {
        let figment = defaults().merge(Serialized::defaults(json!({
            "ledger": { "backend": "memory", "signup_free_downloads": 3 },
            "rate_limit": { "enabled": false }
        })));

        let config = extract_config(figment).unwrap();

        assert_eq!(config.ledger.backend, LedgerBackend::Memory);
        assert_eq!(config.ledger.signup_free_downloads, 3);
        assert_eq!(config.ledger.max_batch_quantity, 1000);
        assert!(!config.rate_limit.enabled);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let figment = defaults().merge(Serialized::defaults(json!({
            "ledger": { "max_batch_quantity": 0 }
        })));

        assert!(matches!(
            extract_config(figment),
            Err(AppError::ConfigError { .. })
        ));
    }
}
