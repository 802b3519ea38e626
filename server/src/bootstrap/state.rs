use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

use resume_builder_adapters::outgoing::{
    in_memory::ledger_store_memory::InMemoryLedgerStoreAdapter,
    postgres_sqlx::{ledger_store_postgres::PostgresLedgerStoreAdapter, migrations::run_migrations},
};
use resume_builder_adapters::shared::app_state::AppState as AdaptersAppState;
use resume_builder_application::error::AppError;
use resume_builder_application::infrastructure_config::{Config, LedgerBackend};
use resume_builder_application::{
    entitlement::service::EntitlementService,
    ports::{incoming::entitlement::EntitlementUseCase, outgoing::ledger_store::DynLedgerStorePort},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub entitlement_service: Arc<dyn EntitlementUseCase + Send + Sync>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let ledger_store = Self::create_ledger_store(&config).await?;
        let entitlement_service = Self::create_entitlement_service(&config, ledger_store)?;

        Ok(Self {
            config,
            entitlement_service,
        })
    }

    /// Assembles the service graph over an already constructed store.
    pub fn with_ledger_store(
        config: Config,
        ledger_store: DynLedgerStorePort,
    ) -> Result<Self, AppError> {
        let entitlement_service = Self::create_entitlement_service(&config, ledger_store)?;

        Ok(Self {
            config: Arc::new(config),
            entitlement_service,
        })
    }

    async fn create_ledger_store(config: &Config) -> Result<DynLedgerStorePort, AppError> {
        match config.ledger.backend {
            LedgerBackend::Memory => {
                info!("Using in-memory ledger; balances are lost on restart");
                Ok(Arc::new(InMemoryLedgerStoreAdapter::new()))
            }
            LedgerBackend::Postgres => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db.pool_size)
                    .connect(config.db.database_url())
                    .await
                    .map_err(|e| AppError::DatabaseError {
                        message: format!("Failed to connect to database: {}", e),
                    })?;

                if config.ledger.run_migrations {
                    run_migrations(&db_pool).await?;
                }

                Ok(Arc::new(PostgresLedgerStoreAdapter::new(
                    db_pool,
                    config.db.query_timeout_secs,
                )))
            }
        }
    }

    fn create_entitlement_service(
        config: &Config,
        ledger_store: DynLedgerStorePort,
    ) -> Result<Arc<dyn EntitlementUseCase + Send + Sync>, AppError> {
        let policy = config.entitlement_policy()?;
        Ok(Arc::new(EntitlementService::new(ledger_store, policy)))
    }

    pub fn to_adapters_state(&self) -> AdaptersAppState {
        AdaptersAppState::new(
            Arc::clone(&self.config),
            Arc::clone(&self.entitlement_service),
        )
    }
}
