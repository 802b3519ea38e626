#[cfg(any(feature = "adapters", feature = "axum", feature = "sqlx"))]
compile_error!("application must not depend on adapters/framework crates");

pub mod entitlement;
pub mod error;
pub mod infrastructure_config;
pub mod ports;
