//! Upstream query capability and the registry that hands it out.
//!
//! Both are implemented outside this workspace (HTTP clients for each
//! game's API, account storage). The reminder and the cache only rely on
//! the shapes below.

use std::sync::Arc;

use async_trait::async_trait;
use notecache_types::Snapshot;

use crate::account::Account;
use crate::error::PlatformError;

/// One game's upstream API.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Platform name, matching [`Account::platform`].
    fn name(&self) -> &str;

    /// Query the account's current notes.
    ///
    /// The returned snapshot carries the account's resource threshold in
    /// its resource pool. Failures are not retried by callers.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when upstream has no data for the account.
    async fn notes(&self, account: &Account) -> Result<Snapshot, PlatformError>;
}

/// Directory of accounts and the platforms serving them.
pub trait Registry: Send + Sync {
    /// Active accounts on every platform not named in `blacklist`.
    fn active_accounts(&self, blacklist: &[String]) -> Vec<Account>;

    /// Names of every platform with at least one active account.
    fn active_platforms(&self) -> Vec<String>;

    /// The query capability for `name`, if registered.
    fn platform(&self, name: &str) -> Option<Arc<dyn Platform>>;

    /// Human-readable name for an upstream region code.
    fn region_name(&self, region: &str) -> String;
}
