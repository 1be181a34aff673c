//! `Dragonfly` (Redis-compatible) snapshot operations.
//!
//! Snapshots are stored as JSON strings with a millisecond expiry (`PX`),
//! so `Dragonfly` reclaims entries the in-memory sweep never sees.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `{prefix}:{account_id}` | JSON | Serialized [`Snapshot`] |
//!
//! The default prefix is `notes`.

use std::time::Duration;

use fred::prelude::*;
use fred::types::Expiration;
use notecache_core::SecondaryStore;
use notecache_types::{AccountId, Snapshot};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DbError;

/// Key prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "notes";

/// Connection handle to a `Dragonfly` instance holding cached snapshots.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
    prefix: String,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("{url}: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self {
            client,
            prefix: DEFAULT_PREFIX.to_owned(),
        })
    }

    /// Use `prefix` instead of [`DEFAULT_PREFIX`] for snapshot keys.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// The `Dragonfly` key holding the snapshot for `account`.
    pub fn key_for(&self, account: &AccountId) -> String {
        format!("{}:{account}", self.prefix)
    }

    /// Serialize `value` as JSON and store it at `key`, expiring after `expiry`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if serialization fails.
    /// Returns [`DbError::Dragonfly`] if the write fails.
    pub async fn set_json_px<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        expiry: Duration,
    ) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        let millis = i64::try_from(expiry.as_millis()).unwrap_or(i64::MAX);
        let _: () = self
            .client
            .set(key, json.as_str(), Some(Expiration::PX(millis)), None, false)
            .await?;
        Ok(())
    }

    /// Read the value at `key` and deserialize it from JSON.
    ///
    /// Returns `Ok(None)` if the key does not exist or has expired.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if deserialization fails.
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DbError> {
        let value: Option<String> = self.client.get(key).await?;
        value
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(DbError::from)
    }

    /// Delete a key from `Dragonfly`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn delete_key(&self, key: &str) -> Result<(), DbError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

impl SecondaryStore for DragonflyStore {
    type Error = DbError;

    async fn get(&self, key: &AccountId) -> Result<Option<Snapshot>, Self::Error> {
        self.get_json(&self.key_for(key)).await
    }

    async fn set(
        &self,
        key: &AccountId,
        value: &Snapshot,
        expiry: Duration,
    ) -> Result<(), Self::Error> {
        self.set_json_px(&self.key_for(key), value, expiry).await
    }

    async fn delete(&self, key: &AccountId) -> Result<(), Self::Error> {
        self.delete_key(&self.key_for(key)).await
    }
}
