// keep public for OpenAPI docs
pub mod accounts;
pub mod downloads;
pub mod health;
pub mod purchases;
