use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot load model artifact '{path}': {reason}")]
    ArtifactLoad { path: String, reason: String },

    #[error("Invalid customer profile '{customer_id}': {reason}")]
    InvalidProfile { customer_id: String, reason: String },

    #[error("Customer '{customer_id}' not found")]
    CustomerNotFound { customer_id: String },

    #[error("No customers in the store")]
    EmptyStore,

    #[error("Classifier returned an invalid probability: {value}")]
    InvalidProbability { value: f64 },

    #[error("Invalid simulation input: {0}")]
    InvalidSimulation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ChurnResult<T> = Result<T, ChurnError>;
