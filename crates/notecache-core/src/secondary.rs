//! Seam for the optional second cache tier.
//!
//! The secondary store is a best-effort mirror: the cache writes through to
//! it and falls back to it on a memory miss, but never trusts it and never
//! fails a caller because of it. Every call is treated as fallible and
//! idempotent.

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use notecache_types::{AccountId, Snapshot};

/// A durable key-value store holding serialized snapshots.
pub trait SecondaryStore: Send + Sync + 'static {
    /// The store's failure type. Only ever logged by the cache.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the snapshot stored for `key`, if any.
    fn get(
        &self,
        key: &AccountId,
    ) -> impl Future<Output = Result<Option<Snapshot>, Self::Error>> + Send;

    /// Store `value` for `key`, expiring after `expiry`.
    fn set(
        &self,
        key: &AccountId,
        value: &Snapshot,
        expiry: Duration,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &AccountId) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Memory-only operation: a secondary store that holds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecondary;

impl SecondaryStore for NoSecondary {
    type Error = Infallible;

    async fn get(&self, _key: &AccountId) -> Result<Option<Snapshot>, Self::Error> {
        Ok(None)
    }

    async fn set(
        &self,
        _key: &AccountId,
        _value: &Snapshot,
        _expiry: Duration,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn delete(&self, _key: &AccountId) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<T: SecondaryStore> SecondaryStore for std::sync::Arc<T> {
    type Error = T::Error;

    fn get(
        &self,
        key: &AccountId,
    ) -> impl Future<Output = Result<Option<Snapshot>, Self::Error>> + Send {
        T::get(self, key)
    }

    fn set(
        &self,
        key: &AccountId,
        value: &Snapshot,
        expiry: Duration,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        T::set(self, key, value, expiry)
    }

    fn delete(&self, key: &AccountId) -> impl Future<Output = Result<(), Self::Error>> + Send {
        T::delete(self, key)
    }
}
