//! The cache service and the per-rate store handles built from it.
//!
//! A single [`CacheService`] owns everything shared: the in-memory map, the
//! secondary store, the clock, and the background sweep. Consumers never
//! touch it directly; they ask it for a [`CacheStore`] carrying their
//! game's regeneration rate and use that for `install`/`fetch`/`invalidate`.
//! All stores built from one service see the same entries and share the
//! one sweep.
//!
//! # Read path
//!
//! ```text
//! fetch(key)
//!     |
//!     +-- memory hit? ------------+
//!     |                           |
//!     +-- secondary hit? ---------+--> project(snapshot, now)
//!     |                                   |
//!     +-- miss --> None                   +-- Fresh      --> write back both tiers, Some
//!                                         +-- Invalidate --> delete both tiers, None
//! ```
//!
//! # Concurrency
//!
//! The map sits behind one async mutex that is held across the whole
//! read-project-writeback sequence, including the secondary-store calls.
//! `now` is sampled after the lock is taken. Concurrent operations on a key
//! therefore apply in some total order and never interleave.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use notecache_types::{AccountId, Snapshot};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::clock::{Clock, SystemClock};
use crate::config::{CacheConfig, ConfigError};
use crate::error::CacheError;
use crate::projector::{self, Projection, ProjectionParams};
use crate::secondary::{NoSecondary, SecondaryStore};

/// State shared by the service, every store handle, and the sweep task.
struct Shared<S> {
    entries: Mutex<HashMap<AccountId, Snapshot>>,
    secondary: S,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<S: SecondaryStore> Shared<S> {
    /// Mirror `snapshot` into the secondary store, logging failures.
    async fn write_through(&self, key: &AccountId, snapshot: &Snapshot) {
        if let Err(e) = self
            .secondary
            .set(key, snapshot, self.config.expiration())
            .await
        {
            tracing::error!(key = %key, error = %e, "Cache: secondary write failed");
        }
    }

    /// Remove `key` from the secondary store, logging failures.
    async fn delete_secondary(&self, key: &AccountId) {
        if let Err(e) = self.secondary.delete(key).await {
            tracing::error!(key = %key, error = %e, "Cache: secondary delete failed");
        }
    }

    async fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now();
        let expiration = self.config.expiration();
        let before = entries.len();
        entries.retain(|_, snapshot| !projector::is_expired(snapshot.last_update, now, expiration));
        let cleared = before.saturating_sub(entries.len());
        tracing::debug!(cleared, remaining = entries.len(), "Cache: cleared expired items");
        cleared
    }
}

/// Process-wide owner of the cache map and its sweep.
///
/// Cheap to clone; every clone refers to the same state.
pub struct CacheService<S = NoSecondary> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for CacheService<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl CacheService<NoSecondary> {
    /// Build a memory-only service on the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the cache config has zero values.
    pub fn memory_only(config: CacheConfig) -> Result<Self, ConfigError> {
        Self::new(config, NoSecondary, Arc::new(SystemClock))
    }
}

impl<S: SecondaryStore> CacheService<S> {
    /// Build a service mirroring into `secondary` and reading time from `clock`.
    ///
    /// The sweep is not running until [`start`](Self::start) is called.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the cache config has zero values.
    pub fn new(config: CacheConfig, secondary: S, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(HashMap::new()),
                secondary,
                clock,
                config,
                sweeper: Mutex::new(None),
            }),
        })
    }

    /// Create a store handle that regenerates one resource unit per `rate`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ZeroRate`] if `rate` is under one millisecond.
    pub fn store(&self, rate: Duration) -> Result<CacheStore<S>, CacheError> {
        if rate.as_millis() == 0 {
            return Err(CacheError::ZeroRate);
        }
        Ok(CacheStore {
            shared: Arc::clone(&self.shared),
            params: ProjectionParams {
                rate,
                expiration: self.shared.config.expiration(),
            },
        })
    }

    /// Start the background sweep. Must be called inside a Tokio runtime.
    ///
    /// Returns `false` without spawning anything if the sweep is already
    /// running, so there is at most one sweep per service.
    pub async fn start(&self) -> bool {
        let mut sweeper = self.shared.sweeper.lock().await;
        if sweeper.is_some() {
            return false;
        }

        let period = self.shared.config.sweep_interval();
        let shared = Arc::downgrade(&self.shared);
        *sweeper = Some(tokio::spawn(run_sweeper(shared, period)));
        tracing::debug!(interval_ms = self.shared.config.sweep_interval_ms, "Cache: sweep started");
        true
    }

    /// Stop the sweep and drop every in-memory entry.
    ///
    /// The secondary store is left alone; its own expiry reclaims it.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.shared.sweeper.lock().await.take() {
            handle.abort();
        }
        self.shared.entries.lock().await.clear();
        tracing::debug!("Cache: shut down");
    }

    /// Whether the background sweep is running.
    pub async fn is_running(&self) -> bool {
        self.shared
            .sweeper
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Run one sweep pass now. Returns the number of entries evicted.
    pub async fn sweep_expired(&self) -> usize {
        self.shared.sweep().await
    }

    /// Number of entries currently held in memory.
    pub async fn len(&self) -> usize {
        self.shared.entries.lock().await.len()
    }

    /// Whether the in-memory map is empty.
    pub async fn is_empty(&self) -> bool {
        self.shared.entries.lock().await.is_empty()
    }

    /// The cache timing this service was built with.
    pub fn config(&self) -> CacheConfig {
        self.shared.config
    }
}

async fn run_sweeper<S: SecondaryStore>(shared: Weak<Shared<S>>, period: Duration) {
    let first = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
    let mut ticker = tokio::time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.sweep().await;
    }
}

/// A view of the shared cache projecting at one regeneration rate.
pub struct CacheStore<S = NoSecondary> {
    shared: Arc<Shared<S>>,
    params: ProjectionParams,
}

impl<S> Clone for CacheStore<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            params: self.params,
        }
    }
}

impl<S: SecondaryStore> CacheStore<S> {
    /// The projection parameters this store applies on read.
    pub const fn params(&self) -> &ProjectionParams {
        &self.params
    }

    /// Install a freshly queried snapshot, stamped with the current time.
    ///
    /// Overwrites any existing entry for `key` in both tiers.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidSnapshot`] if the snapshot is malformed.
    /// Secondary-store failures are logged, never returned.
    pub async fn install(&self, key: &AccountId, snapshot: Snapshot) -> Result<(), CacheError> {
        self.install_with(key, snapshot, None).await
    }

    /// Install a snapshot stamped with an explicit `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidSnapshot`] if the snapshot is malformed.
    pub async fn install_at(
        &self,
        key: &AccountId,
        snapshot: Snapshot,
        timestamp: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        self.install_with(key, snapshot, Some(timestamp)).await
    }

    async fn install_with(
        &self,
        key: &AccountId,
        mut snapshot: Snapshot,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(), CacheError> {
        snapshot
            .validate()
            .map_err(|source| CacheError::InvalidSnapshot {
                key: key.clone(),
                source,
            })?;

        let mut entries = self.shared.entries.lock().await;
        snapshot.last_update = timestamp.unwrap_or_else(|| self.shared.clock.now());
        entries.insert(key.clone(), snapshot.clone());
        self.shared.write_through(key, &snapshot).await;
        tracing::debug!(key = %key, "Cache: set");
        Ok(())
    }

    /// Look up `key`, project it to now, and return it if still valid.
    ///
    /// `None` is a miss or an invalidation; either way the caller should
    /// query upstream. A projected entry is written back to both tiers; an
    /// invalidated one is removed from both.
    pub async fn fetch(&self, key: &AccountId) -> Option<Snapshot> {
        let mut entries = self.shared.entries.lock().await;

        let cached = if let Some(snapshot) = entries.remove(key) {
            tracing::debug!(key = %key, tier = "memory", "Cache: hit");
            snapshot
        } else {
            match self.shared.secondary.get(key).await {
                Ok(Some(snapshot)) => {
                    tracing::debug!(key = %key, tier = "secondary", "Cache: hit");
                    snapshot
                }
                Ok(None) => {
                    tracing::debug!(key = %key, "Cache: miss");
                    return None;
                }
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "Cache: secondary read failed");
                    return None;
                }
            }
        };

        if let Err(e) = cached.validate() {
            tracing::warn!(key = %key, error = %e, "Cache: dropping malformed entry");
            self.shared.delete_secondary(key).await;
            return None;
        }

        let now = self.shared.clock.now();
        match projector::project(cached, now, &self.params) {
            Projection::Fresh(snapshot) => {
                // Memory first: a caller dropping this future during the
                // secondary write must not lose the entry.
                entries.insert(key.clone(), snapshot.clone());
                self.shared.write_through(key, &snapshot).await;
                Some(snapshot)
            }
            Projection::Invalidate(reason) => {
                tracing::debug!(key = %key, %reason, "Cache: invalidated on read");
                self.shared.delete_secondary(key).await;
                None
            }
        }
    }

    /// Remove `key` from both tiers. Absent keys are fine.
    pub async fn invalidate(&self, key: &AccountId) {
        let mut entries = self.shared.entries.lock().await;
        entries.remove(key);
        self.shared.delete_secondary(key).await;
        tracing::debug!(key = %key, "Cache: invalidated");
    }
}
