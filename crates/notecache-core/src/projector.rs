//! Projection of a cached snapshot to the current time.
//!
//! Given a stored [`Snapshot`] and "now", [`project`] advances every
//! simulated counter by the elapsed wall-clock time and decides whether the
//! result is still a safe stand-in for a real upstream query.
//!
//! # Order of operations
//!
//! 1. Hard expiration: entries older than the configured expiration are
//!    dropped before anything else is touched.
//! 2. Resource pool: accumulate regeneration progress, convert whole units,
//!    clamp at max, count down the recovery timer, then apply the terminal
//!    checks (full, above threshold, almost full and above threshold).
//! 3. Timed tasks: count every task down; any task reaching zero ends the
//!    projection.
//! 4. Rotation flag: a finished rotation ends the projection.
//! 5. Secondary currency: count down the recovery timer; full or recovered
//!    ends the projection.
//! 6. Otherwise stamp `last_update` and hand the snapshot back.
//!
//! Any single terminal condition is enough to invalidate; the reported
//! [`InvalidationReason`] is the first one met in the order above.
//!
//! The projector is total over validated snapshots. It performs no I/O and
//! never fails; persistence is the store's job.

use std::time::Duration;

use chrono::{DateTime, Utc};
use notecache_types::{ResourcePool, SecondaryCurrency, Snapshot, TimedTask};

/// How close to max the pool must be for the "almost full" rule to apply.
const ALMOST_FULL_MARGIN: u32 = 10;

/// Milliseconds per second, for rounding elapsed time.
const MILLIS_PER_SEC: u64 = 1000;

/// Per-store parameters of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionParams {
    /// Time needed to regenerate one unit of the resource pool.
    pub rate: Duration,

    /// Age after which a snapshot is dropped outright.
    pub expiration: Duration,
}

/// Outcome of projecting a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// The advanced snapshot is still a faithful approximation.
    Fresh(Snapshot),

    /// The snapshot must be discarded from every cache tier.
    Invalidate(InvalidationReason),
}

/// Why a projection was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    /// Older than the configured expiration.
    Expired,
    /// Resource pool reached its maximum.
    ResourceFull,
    /// Resource pool is above the account's threshold.
    AboveThreshold,
    /// Resource pool is within the almost-full margin and above threshold.
    AlmostFull,
    /// A timed task finished.
    TaskCompleted,
    /// The rotation reached its terminal state.
    RotationFinished,
    /// Secondary currency reached its maximum.
    CurrencyFull,
    /// Secondary currency recovery timer ran out.
    CurrencyRecovered,
}

impl core::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Expired => "expired",
            Self::ResourceFull => "resource full",
            Self::AboveThreshold => "resource above threshold",
            Self::AlmostFull => "resource almost full",
            Self::TaskCompleted => "timed task completed",
            Self::RotationFinished => "rotation finished",
            Self::CurrencyFull => "secondary currency full",
            Self::CurrencyRecovered => "secondary currency recovered",
        };
        f.write_str(label)
    }
}

/// Advance `snapshot` to `now`.
///
/// Elapsed time is clamped at zero, so a clock that steps backwards never
/// rewinds counters and never moves `last_update` back.
pub fn project(mut snapshot: Snapshot, now: DateTime<Utc>, params: &ProjectionParams) -> Projection {
    if is_expired(snapshot.last_update, now, params.expiration) {
        return Projection::Invalidate(InvalidationReason::Expired);
    }

    let elapsed_ms = elapsed_millis(snapshot.last_update, now);

    let elapsed_secs = round_secs(elapsed_ms);
    let rate_ms = u64::try_from(params.rate.as_millis()).unwrap_or(u64::MAX);

    if let Some(pool) = snapshot.resource_pool.as_mut()
        && let Some(reason) = advance_pool(pool, elapsed_ms, elapsed_secs, rate_ms)
    {
        return Projection::Invalidate(reason);
    }

    if let Some(tasks) = snapshot.timed_tasks.as_mut()
        && advance_tasks(tasks, elapsed_secs)
    {
        return Projection::Invalidate(InvalidationReason::TaskCompleted);
    }

    if snapshot
        .rotation_flag
        .as_ref()
        .is_some_and(notecache_types::RotationFlag::is_finished)
    {
        return Projection::Invalidate(InvalidationReason::RotationFinished);
    }

    if let Some(currency) = snapshot.secondary_currency.as_mut()
        && let Some(reason) = advance_currency(currency, elapsed_secs)
    {
        return Projection::Invalidate(reason);
    }

    if now > snapshot.last_update {
        snapshot.last_update = now;
    }
    Projection::Fresh(snapshot)
}

/// Whether a snapshot last updated at `last_update` is older than `expiration`.
///
/// Shared by the read path and the background sweep so both apply the same
/// bound.
pub fn is_expired(last_update: DateTime<Utc>, now: DateTime<Utc>, expiration: Duration) -> bool {
    u128::from(elapsed_millis(last_update, now)) > expiration.as_millis()
}

/// Milliseconds from `since` to `now`, clamped at zero.
fn elapsed_millis(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let delta = now.signed_duration_since(since).num_milliseconds();
    u64::try_from(delta).unwrap_or(0)
}

/// Round milliseconds to whole seconds, halves away from zero.
const fn round_secs(millis: u64) -> u64 {
    millis.saturating_add(MILLIS_PER_SEC / 2) / MILLIS_PER_SEC
}

/// Regenerate the pool and report the first terminal condition met.
///
/// Progress is accumulated in milliseconds and only whole units are moved
/// into `current`; the remainder stays in `regen_progress_ms`, so the units
/// gained over any sequence of reads equal `floor(total_elapsed / rate)`.
fn advance_pool(
    pool: &mut ResourcePool,
    elapsed_ms: u64,
    elapsed_secs: u64,
    rate_ms: u64,
) -> Option<InvalidationReason> {
    let progress = pool.regen_progress_ms.saturating_add(elapsed_ms);
    let gained = progress.checked_div(rate_ms).unwrap_or(0);
    pool.regen_progress_ms = progress.checked_rem(rate_ms).unwrap_or(0);

    let regenerated = u64::from(pool.current)
        .saturating_add(gained)
        .min(u64::from(pool.max));
    pool.current = u32::try_from(regenerated).unwrap_or(pool.max);
    pool.recovery_time_secs = pool.recovery_time_secs.saturating_sub(elapsed_secs);

    let above_threshold = pool.current > pool.threshold;
    let almost_full = pool.max.saturating_sub(pool.current) <= ALMOST_FULL_MARGIN && above_threshold;

    if pool.current == pool.max {
        Some(InvalidationReason::ResourceFull)
    } else if above_threshold {
        Some(InvalidationReason::AboveThreshold)
    } else if almost_full {
        // Shadowed by `above_threshold` today; keep it if that check is relaxed.
        Some(InvalidationReason::AlmostFull)
    } else {
        None
    }
}

/// Count every task down. Returns `true` if any task finished.
fn advance_tasks(tasks: &mut [TimedTask], elapsed_secs: u64) -> bool {
    let mut completed = false;
    for task in tasks.iter_mut() {
        task.remaining_secs = task.remaining_secs.saturating_sub(elapsed_secs);
        completed |= task.remaining_secs == 0;
    }
    completed
}

fn advance_currency(
    currency: &mut SecondaryCurrency,
    elapsed_secs: u64,
) -> Option<InvalidationReason> {
    currency.recovery_time_secs = currency.recovery_time_secs.saturating_sub(elapsed_secs);

    if currency.current == currency.max {
        Some(InvalidationReason::CurrencyFull)
    } else if currency.recovery_time_secs == 0 {
        Some(InvalidationReason::CurrencyRecovered)
    } else {
        None
    }
}
