//! Snapshot projector and simulation-aware cache for notecache.
//!
//! The cache stores per-account [`Snapshot`]s and, on every read, advances
//! their counters by the wall-clock time elapsed since the last update.
//! When the projection can no longer stand in for a real upstream query
//! the entry is dropped and the caller gets a miss.
//!
//! # Modules
//!
//! - [`clock`] -- Wall-clock abstraction with a manual clock for tests.
//! - [`config`] -- Configuration loading from `notecache-config.yaml`.
//! - [`error`] -- Cache error types.
//! - [`projector`] -- Pure projection of a snapshot to the current time.
//! - [`secondary`] -- [`SecondaryStore`] seam for the optional second tier.
//! - [`store`] -- [`CacheService`] owning the map and sweep, and the
//!   per-rate [`CacheStore`] handles consumers use.
//!
//! [`Snapshot`]: notecache_types::Snapshot
//! [`SecondaryStore`]: secondary::SecondaryStore
//! [`CacheService`]: store::CacheService
//! [`CacheStore`]: store::CacheStore

pub mod clock;
pub mod config;
pub mod error;
pub mod projector;
pub mod secondary;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, ConfigError, NotecacheConfig};
pub use error::CacheError;
pub use projector::{InvalidationReason, Projection, ProjectionParams, project};
pub use secondary::{NoSecondary, SecondaryStore};
pub use store::{CacheService, CacheStore};
