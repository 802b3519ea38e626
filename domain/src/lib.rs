pub mod entitlement;
pub mod error;
pub mod user;
