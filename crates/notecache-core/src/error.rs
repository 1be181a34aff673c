//! Error types for the cache.
//!
//! Cache misses and projector invalidations are normal outcomes and are
//! reported as `None`, not as errors. Secondary-store failures are logged
//! and recovered inside the store. What remains is the caller handing the
//! cache something it must not store.

use notecache_types::{AccountId, SnapshotError};

/// Errors returned by cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The snapshot failed install-time validation and was not stored.
    #[error("refusing to cache malformed snapshot for {key}: {source}")]
    InvalidSnapshot {
        /// The account the snapshot was meant for.
        key: AccountId,
        /// What was wrong with it.
        source: SnapshotError,
    },

    /// A store was requested with a zero regeneration rate.
    #[error("regeneration rate must be at least one millisecond per unit")]
    ZeroRate,
}
