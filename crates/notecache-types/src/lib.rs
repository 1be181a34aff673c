//! Shared type definitions for the notecache workspace.
//!
//! This crate is the single source of truth for the cached unit, the
//! [`Snapshot`], and the identifiers used to key it. Every other crate
//! in the workspace consumes these types; none of them redefine them.
//!
//! # Modules
//!
//! - [`ids`] -- Opaque account identifier used as the cache key
//! - [`snapshot`] -- Snapshot structs (resource pool, timed tasks, rotation
//!   flag, secondary currency, pass-through identity) and install-time
//!   validation

pub mod ids;
pub mod snapshot;

pub use ids::AccountId;
pub use snapshot::{
    DailyProgress, Identity, ROTATION_FINISHED, ResourcePool, RotationFlag, SecondaryCurrency,
    Snapshot, SnapshotError, TimedTask,
};
