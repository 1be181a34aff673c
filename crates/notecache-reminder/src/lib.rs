//! Consumer side of the notecache cache.
//!
//! The cache itself never talks to upstream or to users. This crate holds
//! the collaborators that do, expressed as traits, plus the one job that
//! ties them together: the daily "don't forget your dailies" reminder.
//!
//! # Modules
//!
//! - [`account`] -- Account metadata supplied by the registry
//! - [`platform`] -- [`Platform`] query capability and [`Registry`] lookup
//! - [`notes`] -- [`NotesSource`]: cache-first note lookup with upstream
//!   fallback
//! - [`notify`] -- Embed and plain-text notification channels
//! - [`format`] -- Duration formatting and Telegram markdown escaping
//! - [`dailies`] -- The dailies reminder job
//! - [`error`] -- Collaborator error types
//!
//! [`Platform`]: platform::Platform
//! [`Registry`]: platform::Registry
//! [`NotesSource`]: notes::NotesSource

pub mod account;
pub mod dailies;
pub mod error;
pub mod format;
pub mod notes;
pub mod notify;
pub mod platform;

pub use account::Account;
pub use dailies::{DailiesReminder, ReminderSummary};
pub use error::{ChannelError, PlatformError};
pub use notes::NotesSource;
pub use notify::{Embed, EmbedAuthor, EmbedChannel, EmbedField, EmbedFooter, MentionHint, TextChannel};
pub use platform::{Platform, Registry};
