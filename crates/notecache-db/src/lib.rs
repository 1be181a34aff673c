//! `Dragonfly` secondary cache tier for notecache.
//!
//! The in-memory map in `notecache-core` is the authoritative cache; this
//! crate provides the durable mirror it writes through to and falls back to
//! after a restart. Entries expire on their own in `Dragonfly` using the
//! same expiration as the in-memory tier.
//!
//! # Modules
//!
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) snapshot operations
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;

pub use dragonfly::DragonflyStore;
pub use error::DbError;
