//! Tests for the dailies reminder and the cache-first notes source.
//!
//! Upstream, the registry, and both channels are in-process fakes that
//! record what they were asked to do.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::significant_drop_tightening
)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use notecache_core::config::ReminderConfig;
use notecache_core::{CacheConfig, CacheService, NoSecondary};
use notecache_reminder::{
    Account, ChannelError, DailiesReminder, Embed, EmbedChannel, MentionHint, NotesSource,
    Platform, PlatformError, Registry, ReminderSummary, TextChannel,
};
use notecache_types::{DailyProgress, ResourcePool, Snapshot};

// =============================================================================
// Fakes
// =============================================================================

struct FakePlatform {
    name: String,
    dailies: DailyProgress,
    failing: AtomicBool,
    queries: AtomicUsize,
}

impl FakePlatform {
    fn new(name: &str, completed: u32) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            dailies: DailyProgress { completed, total: 4 },
            failing: AtomicBool::new(false),
            queries: AtomicUsize::new(0),
        })
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for FakePlatform {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notes(&self, account: &Account) -> Result<Snapshot, PlatformError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlatformError::Request {
                message: format!("no data for {}", account.uid),
            });
        }

        let mut snapshot = Snapshot::new(Utc::now());
        snapshot.resource_pool = Some(ResourcePool {
            current: 40,
            max: 160,
            recovery_time_secs: 3_900,
            regen_progress_ms: 0,
            threshold: 150,
        });
        snapshot.dailies = Some(self.dailies);
        snapshot.identity.game = "Genshin Impact".to_owned();
        snapshot.identity.author = "Paimon".to_owned();
        snapshot.identity.logo = "https://example.invalid/logo.png".to_owned();
        snapshot.identity.color = 0x00FF_AA00;
        Ok(snapshot)
    }
}

#[derive(Default)]
struct FakeRegistry {
    accounts: Vec<Account>,
    platforms: HashMap<String, Arc<dyn Platform>>,
}

impl FakeRegistry {
    fn with_platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platforms.insert(platform.name().to_owned(), platform);
        self
    }

    fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }
}

impl Registry for FakeRegistry {
    fn active_accounts(&self, blacklist: &[String]) -> Vec<Account> {
        self.accounts
            .iter()
            .filter(|a| !blacklist.contains(&a.platform))
            .cloned()
            .collect()
    }

    fn active_platforms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.platforms.keys().cloned().collect();
        names.sort();
        names
    }

    fn platform(&self, name: &str) -> Option<Arc<dyn Platform>> {
        self.platforms.get(name).cloned()
    }

    fn region_name(&self, region: &str) -> String {
        match region {
            "os_euro" => "Europe".to_owned(),
            other => other.to_owned(),
        }
    }
}

#[derive(Default)]
struct RecordingEmbeds {
    sent: Mutex<Vec<(Embed, MentionHint)>>,
    failing: AtomicBool,
}

#[async_trait]
impl EmbedChannel for RecordingEmbeds {
    async fn send(&self, embed: &Embed, hint: &MentionHint) -> Result<(), ChannelError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChannelError {
                channel: "webhook".to_owned(),
                message: "404".to_owned(),
            });
        }
        self.sent.lock().unwrap().push((embed.clone(), hint.clone()));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingTexts {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl TextChannel for RecordingTexts {
    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(text.to_owned());
        Ok(())
    }
}

fn account(uid: &str, platform: &str) -> Account {
    Account {
        uid: uid.to_owned(),
        nickname: "Traveler".to_owned(),
        region: "os_euro".to_owned(),
        platform: platform.to_owned(),
        dailies_check: true,
        discord_user_id: Some("1234".to_owned()),
    }
}

fn notes_source(platforms: &[&str]) -> NotesSource<NoSecondary> {
    let service = CacheService::memory_only(CacheConfig::default()).unwrap();
    platforms.iter().fold(NotesSource::new(), |source, name| {
        source.with_store(*name, service.store(Duration::from_secs(480)).unwrap())
    })
}

struct Harness {
    reminder: DailiesReminder<NoSecondary>,
    embeds: Arc<RecordingEmbeds>,
    texts: Arc<RecordingTexts>,
}

fn harness(registry: FakeRegistry) -> Harness {
    let names: Vec<String> = registry.active_platforms();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let embeds = Arc::new(RecordingEmbeds::default());
    let texts = Arc::new(RecordingTexts::default());
    let reminder = DailiesReminder::new(
        Arc::new(registry),
        notes_source(&names),
        ReminderConfig::default(),
    )
    .with_embed_channel(embeds.clone())
    .with_text_channel(texts.clone());
    Harness {
        reminder,
        embeds,
        texts,
    }
}

// =============================================================================
// Reminder
// =============================================================================

#[tokio::test]
async fn incomplete_dailies_get_an_embed_and_a_text() {
    let genshin = FakePlatform::new("genshin", 1);
    let h = harness(
        FakeRegistry::default()
            .with_platform(genshin.clone())
            .with_account(account("600000001", "genshin")),
    );

    let summary = h.reminder.run().await;
    assert_eq!(
        summary,
        ReminderSummary {
            accounts_checked: 1,
            reminders_sent: 1
        }
    );

    let embeds = h.embeds.sent.lock().unwrap();
    assert_eq!(embeds.len(), 1);
    let (embed, hint) = &embeds[0];
    assert_eq!(embed.title, "Dailies Reminder");
    assert_eq!(embed.color, 0x00FF_AA00);
    assert_eq!(embed.author.name, "Paimon");
    let fields: Vec<(&str, &str)> = embed
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.value.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("UID", "600000001"),
            ("Username", "Traveler"),
            ("Region", "Europe"),
            ("Completed Dailies", "1/4"),
            ("Current Stamina", "40/160 (1h 5m)"),
        ]
    );
    assert!(embed.fields.iter().all(|f| f.inline));
    assert_eq!(hint.content.as_deref(), Some("<@1234>"));
    assert_eq!(hint.author, "Paimon");

    let texts = h.texts.sent.lock().unwrap();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("Genshin Impact"));
    assert!(texts[0].contains("1/4"));
    assert!(texts[0].contains("Don't Forget to Do Your Dailies\\!"));
}

#[tokio::test]
async fn completed_dailies_are_not_reminded() {
    let genshin = FakePlatform::new("genshin", 4);
    let h = harness(
        FakeRegistry::default()
            .with_platform(genshin)
            .with_account(account("600000001", "genshin")),
    );

    let summary = h.reminder.run().await;
    assert_eq!(summary.accounts_checked, 1);
    assert_eq!(summary.reminders_sent, 0);
    assert!(h.embeds.sent.lock().unwrap().is_empty());
    assert!(h.texts.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn opted_out_accounts_are_never_queried() {
    let genshin = FakePlatform::new("genshin", 0);
    let mut opted_out = account("600000001", "genshin");
    opted_out.dailies_check = false;
    let h = harness(
        FakeRegistry::default()
            .with_platform(genshin.clone())
            .with_account(opted_out),
    );

    let summary = h.reminder.run().await;
    assert_eq!(summary, ReminderSummary::default());
    assert_eq!(genshin.queries(), 0);
}

#[tokio::test]
async fn failed_query_skips_the_account() {
    let genshin = FakePlatform::new("genshin", 0);
    genshin.failing.store(true, Ordering::SeqCst);
    let h = harness(
        FakeRegistry::default()
            .with_platform(genshin.clone())
            .with_account(account("600000001", "genshin")),
    );

    let summary = h.reminder.run().await;
    assert_eq!(summary.accounts_checked, 1);
    assert_eq!(summary.reminders_sent, 0);
    assert_eq!(genshin.queries(), 1);
}

#[tokio::test]
async fn blacklisted_platforms_are_left_out() {
    let genshin = FakePlatform::new("genshin", 0);
    let honkai = FakePlatform::new("honkai", 0);
    let h = harness(
        FakeRegistry::default()
            .with_platform(genshin)
            .with_platform(honkai.clone())
            .with_account(account("600000001", "genshin"))
            .with_account(account("700000001", "honkai")),
    );

    let summary = h.reminder.run().await;
    assert_eq!(summary.reminders_sent, 1);
    assert_eq!(honkai.queries(), 0);
}

#[tokio::test]
async fn no_accounts_is_a_quiet_no_op() {
    let genshin = FakePlatform::new("genshin", 0);
    let h = harness(FakeRegistry::default().with_platform(genshin.clone()));

    assert_eq!(h.reminder.run().await, ReminderSummary::default());
    assert_eq!(genshin.queries(), 0);
}

#[tokio::test]
async fn second_run_is_served_from_cache() {
    let genshin = FakePlatform::new("genshin", 1);
    let h = harness(
        FakeRegistry::default()
            .with_platform(genshin.clone())
            .with_account(account("600000001", "genshin")),
    );

    h.reminder.run().await;
    h.reminder.run().await;

    assert_eq!(genshin.queries(), 1);
    assert_eq!(h.embeds.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn a_failing_channel_does_not_stop_the_run() {
    let genshin = FakePlatform::new("genshin", 0);
    let h = harness(
        FakeRegistry::default()
            .with_platform(genshin)
            .with_account(account("600000001", "genshin"))
            .with_account(account("600000002", "genshin")),
    );
    h.embeds.failing.store(true, Ordering::SeqCst);

    let summary = h.reminder.run().await;
    assert_eq!(summary.reminders_sent, 2);
    assert_eq!(h.texts.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn unregistered_platform_is_skipped() {
    let h = harness(FakeRegistry::default().with_account(account("600000001", "genshin")));
    assert_eq!(h.reminder.run().await, ReminderSummary::default());
}

// =============================================================================
// Notes source
// =============================================================================

#[tokio::test]
async fn refresh_bypasses_the_cache() {
    let genshin = FakePlatform::new("genshin", 1);
    let source = notes_source(&["genshin"]);
    let owner = account("600000001", "genshin");

    assert!(source.notes(genshin.as_ref(), &owner).await.is_some());
    assert!(source.notes(genshin.as_ref(), &owner).await.is_some());
    assert_eq!(genshin.queries(), 1);

    assert!(source.refresh(genshin.as_ref(), &owner).await.is_some());
    assert_eq!(genshin.queries(), 2);
}

#[tokio::test]
async fn platforms_without_a_store_always_query() {
    let genshin = FakePlatform::new("genshin", 1);
    let source = notes_source(&[]);
    let owner = account("600000001", "genshin");

    source.notes(genshin.as_ref(), &owner).await;
    source.notes(genshin.as_ref(), &owner).await;
    assert_eq!(genshin.queries(), 2);
}
