pub mod ledger_store_memory;
