//! Account metadata supplied by the registry.

use notecache_types::AccountId;
use serde::{Deserialize, Serialize};

/// One upstream game account the reminder jobs know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Upstream uid; also the cache key.
    pub uid: String,

    /// In-game nickname.
    pub nickname: String,

    /// Upstream region code (e.g. `os_euro`).
    pub region: String,

    /// Name of the platform this account belongs to (e.g. `genshin`).
    pub platform: String,

    /// Whether the owner wants dailies reminders.
    #[serde(default = "default_true")]
    pub dailies_check: bool,

    /// Discord user to mention on webhook reminders.
    #[serde(default)]
    pub discord_user_id: Option<String>,
}

impl Account {
    /// The cache key for this account.
    pub fn cache_key(&self) -> AccountId {
        AccountId::new(self.uid.as_str())
    }

    /// Discord mention markup for the owner, if known.
    pub fn mention(&self) -> Option<String> {
        self.discord_user_id.as_ref().map(|id| format!("<@{id}>"))
    }
}

const fn default_true() -> bool {
    true
}
