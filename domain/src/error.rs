use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid purchase quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Purchase batch {0} has no remaining downloads")]
    BatchExhausted(String),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

pub type DomainResult<T> = Result<T, DomainError>;
