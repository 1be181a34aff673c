//! Outbound notification channels.
//!
//! Two shapes exist upstream: chat webhooks that take a rich embed, and
//! messengers that take escaped plain text. Delivery is fire-and-forget
//! from the job's point of view; errors are logged by the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ChannelError;

/// A rich chat embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    /// Accent color as an RGB integer.
    pub color: u32,
    /// Embed title.
    pub title: String,
    /// Author block shown above the title.
    pub author: EmbedAuthor,
    /// Body text.
    pub description: String,
    /// Inline key-value pairs.
    pub fields: Vec<EmbedField>,
    /// When the embed was composed.
    pub timestamp: DateTime<Utc>,
    /// Footer block.
    pub footer: EmbedFooter,
}

/// Author block of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedAuthor {
    /// Display name.
    pub name: String,
    /// Icon URL.
    pub icon_url: String,
}

/// One key-value pair of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    /// Field label.
    pub name: String,
    /// Field value.
    pub value: String,
    /// Whether the field shares a row with its neighbours.
    pub inline: bool,
}

impl EmbedField {
    /// An inline field.
    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: true,
        }
    }
}

/// Footer block of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    /// Footer text.
    pub text: String,
    /// Icon URL.
    pub icon_url: String,
}

/// How the receiving side should address the message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MentionHint {
    /// Mention markup placed in the message content, e.g. `<@1234>`.
    pub content: Option<String>,
    /// Display name to post as.
    pub author: String,
    /// Avatar URL to post with.
    pub icon: String,
}

/// A channel that accepts rich embeds.
#[async_trait]
pub trait EmbedChannel: Send + Sync {
    /// Deliver `embed`, addressed per `hint`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if delivery failed.
    async fn send(&self, embed: &Embed, hint: &MentionHint) -> Result<(), ChannelError>;
}

/// A channel that accepts already-escaped plain text.
#[async_trait]
pub trait TextChannel: Send + Sync {
    /// Deliver `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if delivery failed.
    async fn send(&self, text: &str) -> Result<(), ChannelError>;
}
