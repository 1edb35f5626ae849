use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Interest rate must be non-negative, got {rate}")]
    NegativeInterestRate { rate: f64 },

    #[error("Data range error: {0}")]
    DataRange(String),

    #[error("Invariant violated at tick {tick}: {detail}")]
    InvariantViolation { tick: u64, detail: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
