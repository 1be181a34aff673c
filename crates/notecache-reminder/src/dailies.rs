//! The daily "don't forget your dailies" reminder.
//!
//! Runs once a day (21:00 in the deployment's cron). For every active
//! account that opted in and still has dailies left, one embed goes to the
//! embed channel and one escaped text message to the text channel. Notes
//! are read through [`NotesSource`], so an account whose snapshot is still
//! trusted by the cache costs no upstream query.

use std::sync::Arc;

use chrono::Utc;
use notecache_core::SecondaryStore;
use notecache_core::config::ReminderConfig;
use notecache_types::Snapshot;

use crate::account::Account;
use crate::format::{escape_markdown, format_duration};
use crate::notes::NotesSource;
use crate::notify::{Embed, EmbedAuthor, EmbedChannel, EmbedField, EmbedFooter, MentionHint, TextChannel};
use crate::platform::Registry;

const TITLE: &str = "Dailies Reminder";
const DESCRIPTION: &str = "Don't forget to complete your dailies!";

/// Outcome of one reminder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderSummary {
    /// Accounts whose notes were looked at.
    pub accounts_checked: usize,
    /// Accounts a reminder was composed for.
    pub reminders_sent: usize,
}

/// The dailies reminder job.
pub struct DailiesReminder<S> {
    registry: Arc<dyn Registry>,
    notes: NotesSource<S>,
    embed: Option<Arc<dyn EmbedChannel>>,
    text: Option<Arc<dyn TextChannel>>,
    config: ReminderConfig,
}

impl<S: SecondaryStore> DailiesReminder<S> {
    /// A reminder with no channels attached.
    pub fn new(registry: Arc<dyn Registry>, notes: NotesSource<S>, config: ReminderConfig) -> Self {
        Self {
            registry,
            notes,
            embed: None,
            text: None,
            config,
        }
    }

    /// Send embeds to `channel`.
    #[must_use]
    pub fn with_embed_channel(mut self, channel: Arc<dyn EmbedChannel>) -> Self {
        self.embed = Some(channel);
        self
    }

    /// Send plain-text messages to `channel`.
    #[must_use]
    pub fn with_text_channel(mut self, channel: Arc<dyn TextChannel>) -> Self {
        self.text = Some(channel);
        self
    }

    /// Run the job once.
    ///
    /// Failed queries and failed sends are logged and skipped; the run
    /// always completes.
    pub async fn run(&self) -> ReminderSummary {
        let mut summary = ReminderSummary::default();

        let accounts = self.registry.active_accounts(&self.config.blacklist);
        if accounts.is_empty() {
            tracing::warn!("DailiesReminder: no active accounts found");
            return summary;
        }

        for name in self.registry.active_platforms() {
            let Some(platform) = self.registry.platform(&name) else {
                tracing::debug!(platform = %name, "DailiesReminder: platform not registered");
                continue;
            };

            for account in accounts.iter().filter(|a| a.platform == name) {
                if !account.dailies_check {
                    continue;
                }

                summary.accounts_checked = summary.accounts_checked.saturating_add(1);
                let Some(notes) = self.notes.notes(platform.as_ref(), account).await else {
                    continue;
                };
                let Some(dailies) = notes.dailies.as_ref() else {
                    continue;
                };
                if dailies.is_complete() {
                    continue;
                }

                let region = self.registry.region_name(&account.region);
                self.remind(account, &notes, &region).await;
                summary.reminders_sent = summary.reminders_sent.saturating_add(1);
            }
        }

        tracing::info!(
            checked = summary.accounts_checked,
            sent = summary.reminders_sent,
            "DailiesReminder: run complete"
        );
        summary
    }

    async fn remind(&self, account: &Account, notes: &Snapshot, region: &str) {
        let dailies = notes
            .dailies
            .as_ref()
            .map(|d| format!("{}/{}", d.completed, d.total))
            .unwrap_or_default();
        let stamina = notes
            .resource_pool
            .as_ref()
            .map_or_else(
                || "-".to_owned(),
                |p| format!("{}/{} ({})", p.current, p.max, format_duration(p.recovery_time_secs)),
            );

        if let Some(channel) = &self.embed {
            let embed = build_embed(account, notes, region, &dailies, &stamina);
            let hint = MentionHint {
                content: account.mention(),
                author: notes.identity.author.clone(),
                icon: notes.identity.logo.clone(),
            };
            if let Err(e) = channel.send(&embed, &hint).await {
                tracing::error!(uid = %account.uid, error = %e, "DailiesReminder: embed send failed");
            }
        }

        if let Some(channel) = &self.text {
            let message = [
                format!("📢 {TITLE}, Don't Forget to Do Your Dailies!"),
                format!("🎮 **Game**: {}", notes.identity.game),
                format!("🆔 **UID**: {} {}", account.uid, account.nickname),
                format!("🌍 **Region**: {region}"),
                format!("📅 **Completed Dailies**: {dailies}"),
                format!("🔋 **Current Stamina**: {stamina}"),
            ]
            .join("\n");
            if let Err(e) = channel.send(&escape_markdown(&message)).await {
                tracing::error!(uid = %account.uid, error = %e, "DailiesReminder: text send failed");
            }
        }
    }
}

fn build_embed(account: &Account, notes: &Snapshot, region: &str, dailies: &str, stamina: &str) -> Embed {
    let identity = &notes.identity;
    Embed {
        color: identity.color,
        title: TITLE.to_owned(),
        author: EmbedAuthor {
            name: identity.author.clone(),
            icon_url: identity.logo.clone(),
        },
        description: DESCRIPTION.to_owned(),
        fields: vec![
            EmbedField::inline("UID", account.uid.as_str()),
            EmbedField::inline("Username", account.nickname.as_str()),
            EmbedField::inline("Region", region),
            EmbedField::inline("Completed Dailies", dailies),
            EmbedField::inline("Current Stamina", stamina),
        ],
        timestamp: Utc::now(),
        footer: EmbedFooter {
            text: TITLE.to_owned(),
            icon_url: identity.logo.clone(),
        },
    }
}
