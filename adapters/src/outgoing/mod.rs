pub mod in_memory;
pub mod postgres_sqlx;
