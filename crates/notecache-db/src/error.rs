//! Error types for the secondary tier.
//!
//! The cache never surfaces these to its callers; they end up in logs.

/// Failure talking to `Dragonfly` or decoding what it returned.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The `Dragonfly` command failed or the connection dropped.
    #[error("dragonfly command failed: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A snapshot could not be encoded, or a stored value is not a snapshot.
    #[error("snapshot json: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The connection URL was rejected.
    #[error("invalid dragonfly config: {0}")]
    Config(String),
}
