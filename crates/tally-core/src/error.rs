//! Error types shared by the durable-store ports.

use thiserror::Error;

/// Durable-store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Durable store connection failed: {0}")]
    Connection(String),

    #[error("Durable store operation failed: {0}")]
    Operation(String),

    #[error("Corrupt value under {key}: {value}")]
    Corrupt { key: String, value: String },

    #[error("No durable store configured")]
    NotConfigured,
}
