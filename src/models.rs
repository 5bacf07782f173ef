use chrono::{DateTime, Utc};
use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use std::sync::{Arc, OnceLock};

use crate::database::Database;
use crate::schedule::ScheduleManager;
use crate::telemetry::TelemetrySink;

/// How often a guild receives a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, poise::ChoiceParameter)]
#[sqlx(type_name = "delivery_frequency", rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// Per-guild quote delivery configuration
///
/// Created and mutated only by the setup commands; the scheduler reads it
/// and writes `last_sent_at`.
#[derive(Debug, Clone)]
pub struct GuildScheduleConfig {
    pub guild_id: GuildId,
    /// No delivery channel means the guild is never due
    pub delivery_channel_id: Option<ChannelId>,
    pub frequency: Frequency,
    /// Wall-clock time in the guild's timezone, "HH:MM"
    pub time_of_day: String,
    /// Day-of-week (0=Sunday..6=Saturday) for Weekly, day-of-month (1-28)
    /// for Monthly, None for Daily
    pub day_parameter: Option<i32>,
    /// IANA timezone identifier, e.g. "America/Chicago"
    pub timezone: String,
    /// Instant of the last attempted delivery
    pub last_sent_at: Option<DateTime<Utc>>,
}

/// A quote from the pool
#[derive(Debug, Clone)]
pub struct Quote {
    pub id: i32,
    pub text: String,
    pub author: Option<String>,
    pub contributor_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Bot state shared across all handlers
pub struct Data {
    /// Database connection
    pub db: Database,
    /// Sink for tick-level telemetry events
    pub telemetry: Arc<dyn TelemetrySink>,
    /// The running schedule worker, set once during framework setup
    pub scheduler: OnceLock<ScheduleManager>,
}

impl Data {
    /// Create a new Data instance with the given database connection
    pub fn new(db: Database, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            db,
            telemetry,
            scheduler: OnceLock::new(),
        }
    }
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Arc<Data>, Error>;
