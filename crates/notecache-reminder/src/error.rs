//! Error types for the external collaborators.
//!
//! Neither kind is fatal to a job: a failed query means "no data for this
//! account", a failed send is logged and the job moves on.

/// An upstream notes query failed.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The upstream API answered with a failure.
    #[error("notes request failed: {message}")]
    Request {
        /// Description of the failure.
        message: String,
    },

    /// The platform does not serve notes for this account.
    #[error("platform {platform} does not support notes")]
    Unsupported {
        /// Platform name.
        platform: String,
    },
}

/// A notification could not be delivered.
#[derive(Debug, thiserror::Error)]
#[error("{channel} send failed: {message}")]
pub struct ChannelError {
    /// Channel name (e.g. `webhook`, `telegram`).
    pub channel: String,
    /// Description of the failure.
    pub message: String,
}
