//! The cached unit: one account's game-status snapshot.
//!
//! A [`Snapshot`] is created from a fresh upstream query, installed into the
//! cache, and then advanced in place by the projector on every read. The
//! optional sections are the counters the projector knows how to simulate;
//! [`DailyProgress`] and [`Identity`] are carried through untouched.
//!
//! # Invariants
//!
//! | Section | Invariant |
//! |---------|-----------|
//! | [`ResourcePool`] | `max >= 1`, `current <= max` |
//! | [`ResourcePool`] | `regen_progress_ms < rate_ms` after every projection |
//! | [`TimedTask`] | `remaining_secs >= 0` (unsigned) |
//! | [`SecondaryCurrency`] | `max >= 1`, `current <= max` |
//!
//! [`Snapshot::validate`] checks the structural invariants at install time so
//! the projector never has to tolerate a malformed snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rotation flag state that forces a refresh.
pub const ROTATION_FINISHED: &str = "Finished";

/// Structural problems detected when a snapshot is installed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// A regenerating quantity has a maximum of zero.
    #[error("{section}: max must be at least 1")]
    ZeroMax {
        /// Which section is malformed.
        section: &'static str,
    },

    /// A regenerating quantity is above its maximum.
    #[error("{section}: current {current} exceeds max {max}")]
    CurrentAboveMax {
        /// Which section is malformed.
        section: &'static str,
        /// The offending current amount.
        current: u32,
        /// The declared maximum.
        max: u32,
    },
}

/// A cached, time-projectable view of one account's upstream status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Time of the last projection step or raw fetch.
    pub last_update: DateTime<Utc>,

    /// Regenerating primary resource (stamina, resin, battery...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_pool: Option<ResourcePool>,

    /// Dispatched background activities, in upstream order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timed_tasks: Option<Vec<TimedTask>>,

    /// Status of the rotating shop or offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_flag: Option<RotationFlag>,

    /// Second regenerating quantity with its own terminal conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_currency: Option<SecondaryCurrency>,

    /// Daily commission progress. Not simulated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dailies: Option<DailyProgress>,

    /// Display metadata. Not simulated.
    #[serde(default)]
    pub identity: Identity,
}

impl Snapshot {
    /// Create an empty snapshot stamped with `last_update`.
    ///
    /// Callers fill in whichever sections their platform reports.
    pub fn new(last_update: DateTime<Utc>) -> Self {
        Self {
            last_update,
            resource_pool: None,
            timed_tasks: None,
            rotation_flag: None,
            secondary_currency: None,
            dailies: None,
            identity: Identity::default(),
        }
    }

    /// Check the structural invariants of every populated section.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] describing the first malformed section.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if let Some(pool) = &self.resource_pool {
            check_bounds("resourcePool", pool.current, pool.max)?;
        }
        if let Some(currency) = &self.secondary_currency {
            check_bounds("secondaryCurrency", currency.current, currency.max)?;
        }
        Ok(())
    }
}

const fn check_bounds(section: &'static str, current: u32, max: u32) -> Result<(), SnapshotError> {
    if max == 0 {
        return Err(SnapshotError::ZeroMax { section });
    }
    if current > max {
        return Err(SnapshotError::CurrentAboveMax {
            section,
            current,
            max,
        });
    }
    Ok(())
}

/// A regenerating integer resource with fractional carry-over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePool {
    /// Whole units currently available.
    pub current: u32,

    /// Upper bound on `current`.
    pub max: u32,

    /// Seconds until the pool is full, as reported upstream.
    pub recovery_time_secs: u64,

    /// Sub-unit regeneration progress in milliseconds toward the next unit.
    ///
    /// This is the fractional accumulator scaled by the per-unit rate, kept
    /// as an integer so that progress carries exactly across reads.
    #[serde(default)]
    pub regen_progress_ms: u64,

    /// Per-account level above which cached data is no longer trusted.
    pub threshold: u32,
}

/// One dispatched background activity (expedition, commission...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedTask {
    /// Seconds until the activity completes.
    pub remaining_secs: u64,
}

/// Status marker of a periodically refreshing shop or offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationFlag {
    /// Upstream state string, e.g. `"Finished"`.
    pub state: String,
}

impl RotationFlag {
    /// Whether the rotation reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.state == ROTATION_FINISHED
    }
}

/// A second regenerating quantity (realm currency, reserve power...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryCurrency {
    /// Amount currently available.
    pub current: u32,

    /// Upper bound on `current`.
    pub max: u32,

    /// Seconds until the currency is full.
    pub recovery_time_secs: u64,
}

/// Daily commission progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgress {
    /// Commissions completed today.
    pub completed: u32,
    /// Commissions available today.
    pub total: u32,
}

impl DailyProgress {
    /// Whether every daily commission is done.
    pub const fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// Display metadata carried alongside the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Human-readable game name.
    #[serde(default)]
    pub game: String,

    /// Author line shown on notifications.
    #[serde(default)]
    pub author: String,

    /// Logo URL.
    #[serde(default)]
    pub logo: String,

    /// Accent color as an RGB integer.
    #[serde(default)]
    pub color: u32,

    /// Anything else the platform attached.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}
