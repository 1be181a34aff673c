//! Cache-first notes lookup.
//!
//! [`NotesSource`] is how jobs read account notes: serve the cached
//! projection when the cache still trusts it, otherwise query upstream and
//! install the fresh result. One [`CacheStore`] is kept per platform because
//! each game regenerates its resource at a different rate.

use std::collections::HashMap;

use notecache_core::{CacheStore, NoSecondary, SecondaryStore};
use notecache_types::Snapshot;

use crate::account::Account;
use crate::platform::Platform;

/// Per-platform cache stores in front of the upstream query.
pub struct NotesSource<S = NoSecondary> {
    stores: HashMap<String, CacheStore<S>>,
}

impl<S> Default for NotesSource<S> {
    fn default() -> Self {
        Self {
            stores: HashMap::new(),
        }
    }
}

impl<S: SecondaryStore> NotesSource<S> {
    /// An empty source. Platforms without a store always query upstream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache notes for `platform` through `store`.
    #[must_use]
    pub fn with_store(mut self, platform: impl Into<String>, store: CacheStore<S>) -> Self {
        self.stores.insert(platform.into(), store);
        self
    }

    /// Notes for `account`, from cache when possible.
    ///
    /// Returns `None` when the cache has nothing usable and the upstream
    /// query failed; the caller should skip the account.
    pub async fn notes(&self, platform: &dyn Platform, account: &Account) -> Option<Snapshot> {
        let store = self.stores.get(platform.name());
        let key = account.cache_key();

        if let Some(store) = store
            && let Some(cached) = store.fetch(&key).await
        {
            return Some(cached);
        }

        self.query(platform, account).await
    }

    /// Drop any cached notes for `account` and query upstream.
    pub async fn refresh(&self, platform: &dyn Platform, account: &Account) -> Option<Snapshot> {
        if let Some(store) = self.stores.get(platform.name()) {
            store.invalidate(&account.cache_key()).await;
        }
        self.query(platform, account).await
    }

    async fn query(&self, platform: &dyn Platform, account: &Account) -> Option<Snapshot> {
        let snapshot = match platform.notes(account).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    platform = platform.name(),
                    uid = %account.uid,
                    error = %e,
                    "Notes: upstream query failed"
                );
                return None;
            }
        };

        if let Some(store) = self.stores.get(platform.name())
            && let Err(e) = store.install(&account.cache_key(), snapshot.clone()).await
        {
            tracing::warn!(uid = %account.uid, error = %e, "Notes: not caching upstream result");
        }
        Some(snapshot)
    }
}
