use std::sync::Arc;

use resume_builder_application::{
    infrastructure_config::Config, ports::incoming::entitlement::EntitlementUseCase,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub entitlement_use_case: Arc<dyn EntitlementUseCase + Send + Sync>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        entitlement_use_case: Arc<dyn EntitlementUseCase + Send + Sync>,
    ) -> Self {
        Self {
            config,
            entitlement_use_case,
        }
    }
}
