pub mod ledger_store_postgres;
pub mod migrations;
pub(crate) mod utils;
