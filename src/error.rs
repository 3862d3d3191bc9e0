use thiserror::Error;

/// Main error type for the marketplace simulation
#[derive(Error, Debug)]
pub enum AgoraError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Decision pipeline errors — every one of these is contained within
    // the turn that produced it (see `agent` module docs)
    #[error("Cannot convert {param}='{raw}' (type: {kind})")]
    Coercion {
        param: String,
        raw: String,
        kind: String,
    },

    #[error("Decision parse error: {0}")]
    Parse(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Decision service error: {0}")]
    Service(String),

    // Market errors
    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for AgoraError
pub type Result<T> = std::result::Result<T, AgoraError>;

/// Specific error types for the offer ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("Offer not found: {offer_id}")]
    OfferNotFound { offer_id: u64 },
}
