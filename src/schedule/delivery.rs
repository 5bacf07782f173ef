use chrono::{DateTime, Utc};
use futures::future::join_all;
use poise::serenity_prelude::{self as serenity, ChannelId, ChannelType, CreateMessage, GuildId};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::evaluator::is_due;
use super::types::{DeliveryError, JobError};
use crate::constants::TELEMETRY_TICK_EVENT;
use crate::database::Database;
use crate::models::{Data, GuildScheduleConfig, Quote};
use crate::telemetry::TelemetrySink;
use crate::utils::message_formatter::format_quote_message;

/// Persistence seam for the delivery pass
///
/// Everything a pass reads or writes goes through here: the guild
/// configurations, the quote pool, and the `last_sent_at` records.
pub trait DeliveryStore: Sync {
    fn list_with_delivery_channel(
        &self,
    ) -> impl Future<Output = Result<Vec<GuildScheduleConfig>, sqlx::Error>> + Send;

    fn sample_quotes(&self, n: i64) -> impl Future<Output = Result<Vec<Quote>, sqlx::Error>> + Send;

    fn update_last_sent(
        &self,
        guild_id: GuildId,
        instant: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

impl DeliveryStore for Database {
    async fn list_with_delivery_channel(&self) -> Result<Vec<GuildScheduleConfig>, sqlx::Error> {
        Database::list_with_delivery_channel(self).await
    }

    async fn sample_quotes(&self, n: i64) -> Result<Vec<Quote>, sqlx::Error> {
        Database::sample_quotes(self, n).await
    }

    async fn update_last_sent(
        &self,
        guild_id: GuildId,
        instant: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        Database::update_last_sent(self, guild_id, instant).await
    }
}

/// Transport seam for quote delivery
///
/// Resolution failures (missing channel, wrong channel type) come back as
/// `DeliveryError::Resolution`; a rejected send as `DeliveryError::Transport`.
pub trait MessagePort: Sync {
    fn send_quote(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Production port backed by the Discord HTTP client
pub struct DiscordPort {
    http: Arc<serenity::Http>,
}

impl DiscordPort {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

impl MessagePort for DiscordPort {
    async fn send_quote(&self, channel_id: ChannelId, content: &str) -> Result<(), DeliveryError> {
        let channel = self
            .http
            .get_channel(channel_id)
            .await
            .map_err(|e| DeliveryError::Resolution(format!("channel {channel_id}: {e}")))?;

        let guild_channel = match channel {
            serenity::Channel::Guild(channel) => channel,
            serenity::Channel::Private(_) => {
                return Err(DeliveryError::Resolution(format!(
                    "channel {channel_id} is a direct-message channel"
                )));
            }
            _ => {
                return Err(DeliveryError::Resolution(format!(
                    "channel {channel_id} has an unsupported kind"
                )));
            }
        };

        if !matches!(guild_channel.kind, ChannelType::Text | ChannelType::News) {
            return Err(DeliveryError::Resolution(format!(
                "channel {channel_id} is not text-capable ({:?})",
                guild_channel.kind
            )));
        }

        let message = CreateMessage::new().content(content);
        guild_channel
            .id
            .send_message(&self.http, message)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }
}

/// Result of one guild's delivery attempt
#[derive(Debug)]
pub enum DeliveryStatus {
    Delivered,
    /// Send was issued and rejected
    Failed(DeliveryError),
    /// Channel never resolved; no send was issued
    Skipped(DeliveryError),
}

#[derive(Debug)]
pub struct DeliveryOutcome {
    pub guild_id: GuildId,
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    /// A delivery counts as attempted once the channel resolved and a send
    /// was issued, regardless of how the send ended
    pub fn attempted(&self) -> bool {
        matches!(
            self.status,
            DeliveryStatus::Delivered | DeliveryStatus::Failed(_)
        )
    }
}

/// Counts reported once per delivery tick
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub due: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub quote_id: Option<i32>,
}

/// Partition configurations into the set due at `now`
fn select_due(configs: &[GuildScheduleConfig], now: DateTime<Utc>) -> Vec<GuildScheduleConfig> {
    configs
        .iter()
        .filter(|config| is_due(config, now))
        .cloned()
        .collect()
}

/// Pick the quote for this tick; an empty pool aborts the whole tick
fn choose_quote(mut quotes: Vec<Quote>) -> Result<Quote, JobError> {
    quotes.pop().ok_or(JobError::NoContentAvailable)
}

/// Concurrently deliver `content` to every due guild
///
/// Settle-all: every attempt runs to completion and reports its own
/// outcome; one guild's failure never short-circuits the batch.
async fn dispatch<P: MessagePort>(
    port: &P,
    due: &[GuildScheduleConfig],
    content: &str,
) -> Vec<DeliveryOutcome> {
    let attempts = due.iter().filter_map(|config| {
        let channel_id = config.delivery_channel_id?;
        let guild_id = config.guild_id;
        Some(async move {
            let status = match port.send_quote(channel_id, content).await {
                Ok(()) => {
                    info!("Delivered quote to guild {} (channel {})", guild_id, channel_id);
                    DeliveryStatus::Delivered
                }
                Err(e @ DeliveryError::Resolution(_)) => {
                    warn!("Skipping guild {}: {}", guild_id, e);
                    DeliveryStatus::Skipped(e)
                }
                Err(e) => {
                    error!("Delivery to guild {} failed: {}", guild_id, e);
                    DeliveryStatus::Failed(e)
                }
            };
            DeliveryOutcome { guild_id, status }
        })
    });

    join_all(attempts).await
}

fn summarize(due: usize, quote_id: Option<i32>, outcomes: &[DeliveryOutcome]) -> TickSummary {
    let mut summary = TickSummary {
        due,
        quote_id,
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome.status {
            DeliveryStatus::Delivered => {
                summary.attempted += 1;
                summary.succeeded += 1;
            }
            DeliveryStatus::Failed(_) => {
                summary.attempted += 1;
                summary.failed += 1;
            }
            DeliveryStatus::Skipped(_) => summary.skipped += 1,
        }
    }
    summary
}

/// Emit the per-tick telemetry event, idle ticks included
fn capture_tick(telemetry: &dyn TelemetrySink, summary: &TickSummary) {
    telemetry.capture(
        TELEMETRY_TICK_EVENT,
        json!({
            "due": summary.due,
            "attempted": summary.attempted,
            "succeeded": summary.succeeded,
            "failed": summary.failed,
            "skipped": summary.skipped,
            "quote_id": summary.quote_id,
        }),
    );
}

/// Run one full delivery evaluation pass against any store and transport
///
/// Selects the due set, picks one quote for the whole batch, fans the send
/// out concurrently, then records `last_sent_at` for every attempted guild.
/// A failed send is not retried inside the period: without an idempotency
/// key on the send, a retry risks duplicate messages, so the guild waits
/// for its next scheduled period.
async fn execute_pass<S: DeliveryStore, P: MessagePort>(
    store: &S,
    port: &P,
    telemetry: &dyn TelemetrySink,
    now: DateTime<Utc>,
) -> Result<TickSummary, JobError> {
    let configs = store.list_with_delivery_channel().await?;
    let due = select_due(&configs, now);
    if due.is_empty() {
        debug!("No guilds due at {}", now);
        let summary = TickSummary::default();
        capture_tick(telemetry, &summary);
        return Ok(summary);
    }

    info!("{} guild(s) due for a quote", due.len());

    // One quote per tick, shared across the whole due set
    let quote = choose_quote(store.sample_quotes(1).await?)?;
    let content = format_quote_message(&quote.text, quote.author.as_deref());

    let outcomes = dispatch(port, &due, &content).await;

    for outcome in outcomes.iter().filter(|o| o.attempted()) {
        if let Err(e) = store.update_last_sent(outcome.guild_id, now).await {
            error!(
                "Failed to record delivery for guild {}: {}",
                outcome.guild_id, e
            );
        }
    }

    let summary = summarize(due.len(), Some(quote.id), &outcomes);
    capture_tick(telemetry, &summary);

    Ok(summary)
}

/// Run one delivery pass against the live database and Discord transport
pub async fn run_delivery_pass(
    http: &Arc<serenity::Http>,
    data: &Data,
) -> Result<TickSummary, JobError> {
    let port = DiscordPort::new(Arc::clone(http));
    execute_pass(&data.db, &port, data.telemetry.as_ref(), Utc::now()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;
    use crate::telemetry::testing::RecordingTelemetry;
    use chrono::TimeZone;
    use poise::serenity_prelude::UserId;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn config(guild: u64, channel: u64) -> GuildScheduleConfig {
        GuildScheduleConfig {
            guild_id: GuildId::new(guild),
            delivery_channel_id: Some(ChannelId::new(channel)),
            frequency: Frequency::Daily,
            time_of_day: "08:00".to_string(),
            day_parameter: None,
            timezone: "UTC".to_string(),
            last_sent_at: None,
        }
    }

    fn quote(id: i32) -> Quote {
        Quote {
            id,
            text: "Stay hungry".to_string(),
            author: Some("Someone".to_string()),
            contributor_id: UserId::new(1),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    /// Port scripted per channel; anything unscripted resolves and succeeds
    struct FakePort {
        behavior: HashMap<ChannelId, DeliveryError>,
        sent: Mutex<Vec<ChannelId>>,
    }

    impl FakePort {
        fn new(behavior: HashMap<ChannelId, DeliveryError>) -> Self {
            Self {
                behavior,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl MessagePort for FakePort {
        async fn send_quote(
            &self,
            channel_id: ChannelId,
            _content: &str,
        ) -> Result<(), DeliveryError> {
            match self.behavior.get(&channel_id) {
                Some(error) => Err(error.clone()),
                None => {
                    self.sent.lock().unwrap().push(channel_id);
                    Ok(())
                }
            }
        }
    }

    #[test]
    fn test_select_due_filters_through_evaluator() {
        let due_at = Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap();
        let mut not_due = config(2, 20);
        not_due.time_of_day = "09:00".to_string();

        let configs = vec![config(1, 10), not_due];
        let due = select_due(&configs, due_at);

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].guild_id, GuildId::new(1));
    }

    #[test]
    fn test_choose_quote_empty_pool_is_fatal() {
        assert!(matches!(
            choose_quote(Vec::new()),
            Err(JobError::NoContentAvailable)
        ));
        assert_eq!(choose_quote(vec![quote(7)]).unwrap().id, 7);
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_block_siblings() {
        let mut behavior = HashMap::new();
        behavior.insert(
            ChannelId::new(10),
            DeliveryError::Transport("boom".to_string()),
        );
        let port = FakePort::new(behavior);

        let due = vec![config(1, 10), config(2, 20)];
        let outcomes = dispatch(&port, &due, "hello").await;

        assert_eq!(outcomes.len(), 2);
        let failed = outcomes
            .iter()
            .find(|o| o.guild_id == GuildId::new(1))
            .unwrap();
        let delivered = outcomes
            .iter()
            .find(|o| o.guild_id == GuildId::new(2))
            .unwrap();

        assert!(matches!(failed.status, DeliveryStatus::Failed(_)));
        assert!(matches!(delivered.status, DeliveryStatus::Delivered));
        // Both count as attempted, so both get their period marked
        assert!(failed.attempted());
        assert!(delivered.attempted());
        assert_eq!(*port.sent.lock().unwrap(), vec![ChannelId::new(20)]);
    }

    #[tokio::test]
    async fn test_resolution_failure_is_skipped_not_attempted() {
        let mut behavior = HashMap::new();
        behavior.insert(
            ChannelId::new(10),
            DeliveryError::Resolution("gone".to_string()),
        );
        let port = FakePort::new(behavior);

        let outcomes = dispatch(&port, &[config(1, 10)], "hello").await;

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0].status, DeliveryStatus::Skipped(_)));
        assert!(!outcomes[0].attempted());
    }

    #[test]
    fn test_summarize_counts() {
        let outcomes = vec![
            DeliveryOutcome {
                guild_id: GuildId::new(1),
                status: DeliveryStatus::Delivered,
            },
            DeliveryOutcome {
                guild_id: GuildId::new(2),
                status: DeliveryStatus::Failed(DeliveryError::Transport("x".to_string())),
            },
            DeliveryOutcome {
                guild_id: GuildId::new(3),
                status: DeliveryStatus::Skipped(DeliveryError::Resolution("y".to_string())),
            },
        ];

        let summary = summarize(3, Some(42), &outcomes);
        assert_eq!(
            summary,
            TickSummary {
                due: 3,
                attempted: 2,
                succeeded: 1,
                failed: 1,
                skipped: 1,
                quote_id: Some(42),
            }
        );
    }

    /// Store over fixed in-memory data, remembering every recorded delivery
    struct FakeStore {
        configs: Vec<GuildScheduleConfig>,
        quotes: Vec<Quote>,
        recorded: Mutex<Vec<GuildId>>,
    }

    impl FakeStore {
        fn new(configs: Vec<GuildScheduleConfig>, quotes: Vec<Quote>) -> Self {
            Self {
                configs,
                quotes,
                recorded: Mutex::new(Vec::new()),
            }
        }
    }

    impl DeliveryStore for FakeStore {
        async fn list_with_delivery_channel(
            &self,
        ) -> Result<Vec<GuildScheduleConfig>, sqlx::Error> {
            Ok(self.configs.clone())
        }

        async fn sample_quotes(&self, n: i64) -> Result<Vec<Quote>, sqlx::Error> {
            Ok(self.quotes.iter().take(n as usize).cloned().collect())
        }

        async fn update_last_sent(
            &self,
            guild_id: GuildId,
            _instant: DateTime<Utc>,
        ) -> Result<(), sqlx::Error> {
            self.recorded.lock().unwrap().push(guild_id);
            Ok(())
        }
    }

    fn due_at() -> DateTime<Utc> {
        // All configs from `config()` are daily 08:00 UTC
        Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_pass_records_attempted_guilds_only() {
        let store = FakeStore::new(
            vec![config(1, 10), config(2, 20), config(3, 30)],
            vec![quote(42)],
        );
        let mut behavior = HashMap::new();
        behavior.insert(
            ChannelId::new(20),
            DeliveryError::Transport("boom".to_string()),
        );
        behavior.insert(
            ChannelId::new(30),
            DeliveryError::Resolution("gone".to_string()),
        );
        let port = FakePort::new(behavior);
        let telemetry = RecordingTelemetry::default();

        let summary = execute_pass(&store, &port, &telemetry, due_at())
            .await
            .unwrap();

        assert_eq!(
            summary,
            TickSummary {
                due: 3,
                attempted: 2,
                succeeded: 1,
                failed: 1,
                skipped: 1,
                quote_id: Some(42),
            }
        );

        // The failed guild still gets its period marked; the skipped guild
        // stays unmarked and is re-examined next period
        let mut recorded = store.recorded.lock().unwrap().clone();
        recorded.sort();
        assert_eq!(recorded, vec![GuildId::new(1), GuildId::new(2)]);

        let events = telemetry.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, TELEMETRY_TICK_EVENT);
        assert_eq!(events[0].1["succeeded"], 1);
        assert_eq!(events[0].1["failed"], 1);
        assert_eq!(events[0].1["skipped"], 1);
        assert_eq!(events[0].1["quote_id"], 42);
    }

    #[tokio::test]
    async fn test_pass_empty_pool_aborts_without_sends_or_records() {
        let store = FakeStore::new(vec![config(1, 10)], Vec::new());
        let port = FakePort::new(HashMap::new());
        let telemetry = RecordingTelemetry::default();

        let result = execute_pass(&store, &port, &telemetry, due_at()).await;

        assert!(matches!(result, Err(JobError::NoContentAvailable)));
        assert!(port.sent.lock().unwrap().is_empty());
        assert!(store.recorded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_idle_tick_still_emits_telemetry() {
        let store = FakeStore::new(vec![config(1, 10)], vec![quote(42)]);
        let port = FakePort::new(HashMap::new());
        let telemetry = RecordingTelemetry::default();

        // 09:30 matches nobody's delivery time
        let off_schedule = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap();
        let summary = execute_pass(&store, &port, &telemetry, off_schedule)
            .await
            .unwrap();

        assert_eq!(summary, TickSummary::default());
        assert!(port.sent.lock().unwrap().is_empty());

        let events = telemetry.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, TELEMETRY_TICK_EVENT);
        assert_eq!(events[0].1["due"], 0);
        assert_eq!(events[0].1["attempted"], 0);
        assert_eq!(events[0].1["quote_id"], serde_json::Value::Null);
    }
}
