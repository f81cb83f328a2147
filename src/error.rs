use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecisionError {
    #[error("Rate limit exceeded for customer {0}")]
    AdmissionDenied(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Signal source failure: {0}")]
    SignalFailure(String),
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: rust_decimal::Decimal,
        requested: rust_decimal::Decimal,
    },
    #[error("Idempotency key '{key}' was reused with a different payload")]
    IdempotencyConflict { key: String },
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}

impl DecisionError {
    /// Short, stable name of the error variant, recorded in agent trace entries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AdmissionDenied(_) => "AdmissionDenied",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::SignalFailure(_) => "SignalFailure",
            Self::InsufficientFunds { .. } => "InsufficientFunds",
            Self::IdempotencyConflict { .. } => "IdempotencyConflict",
            Self::DuplicateKey(_) => "DuplicateKey",
            Self::Config(_) => "Config",
            Self::Storage(_) => "Storage",
            Self::Csv(_) => "Csv",
            Self::Io(_) => "Io",
            Self::Json(_) => "Json",
            #[cfg(feature = "storage-rocksdb")]
            Self::RocksDb(_) => "RocksDb",
        }
    }
}

pub type Result<T> = std::result::Result<T, DecisionError>;
