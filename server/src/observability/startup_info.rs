use resume_builder_application::infrastructure_config::{
    Config, LedgerBackend, LedgerConfig, RateLimitConfig,
};
use tracing::info;

pub fn print_api_info(config: &Config) {
    print_api_documentation_info(config);
    print_configuration_info(config);
    print_rate_limiting_info(&config.rate_limit);
}

fn print_api_documentation_info(config: &Config) {
    if !cfg!(feature = "docs") {
        return;
    }

    let base_url = format!("http://{}", config.server_address());
    info!("📋 API Documentation:");
    info!("  📖 Swagger UI: {}/docs", base_url);
    info!("  📄 OpenAPI JSON: {}/api-docs/openapi.json", base_url);
}

fn print_configuration_info(config: &Config) {
    info!("⚙️  Configuration ({}):", config.environment.env);
    print_ledger_configuration(&config.ledger);

    if config.ledger.backend == LedgerBackend::Postgres {
        info!(
            "  🗄️  Database: {} (pool {}, query timeout {}s)",
            config.db.redacted_url(),
            config.db.pool_size,
            config.db.query_timeout_secs
        );
    }
}

fn print_ledger_configuration(ledger: &LedgerConfig) {
    let backend = match ledger.backend {
        LedgerBackend::Postgres => "PostgreSQL",
        LedgerBackend::Memory => "in-memory (not persisted)",
    };
    info!("  📒 Ledger: {}", backend);
    info!(
        "  🎁 Signup allowance: {} free download(s), max {} per purchase",
        ledger.signup_free_downloads, ledger.max_batch_quantity
    );
}

fn print_rate_limiting_info(rate_limit: &RateLimitConfig) {
    if rate_limit.enabled {
        info!("  🚦 Rate Limiting: ENABLED");
        print_rate_limits(rate_limit);
    } else {
        info!("  🚦 Rate Limiting: DISABLED");
    }
}

fn print_rate_limits(rate_limit: &RateLimitConfig) {
    let limits = [
        ("Downloads", rate_limit.download_requests_per_minute),
        ("Purchases", rate_limit.purchase_requests_per_minute),
        ("Global", rate_limit.global_requests_per_minute),
    ];

    for (name, per_minute) in limits {
        info!(
            "    • {}: {}/min (burst: {})",
            name,
            per_minute,
            per_minute.saturating_mul(rate_limit.burst_size_multiplier)
        );
    }
}
