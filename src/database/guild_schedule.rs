use super::Database;
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{ChannelId, GuildId};
use sqlx::Error as SqlxError;

use crate::models::{Frequency, GuildScheduleConfig};

type ConfigRow = (
    i64,
    Option<i64>,
    Frequency,
    String,
    Option<i32>,
    String,
    Option<DateTime<Utc>>,
);

fn config_from_row(row: ConfigRow) -> GuildScheduleConfig {
    let (guild_id, channel_id, frequency, time_of_day, day_parameter, timezone, last_sent_at) = row;
    GuildScheduleConfig {
        guild_id: GuildId::new(guild_id as u64),
        delivery_channel_id: channel_id.map(|id| ChannelId::new(id as u64)),
        frequency,
        time_of_day,
        day_parameter,
        timezone,
        last_sent_at,
    }
}

impl Database {
    /// Create or replace a guild's delivery configuration
    pub async fn upsert_guild_schedule(
        &self,
        guild_id: GuildId,
        delivery_channel_id: ChannelId,
        frequency: Frequency,
        time_of_day: &str,
        day_parameter: Option<i32>,
        timezone: &str,
    ) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            INSERT INTO guild_quote_schedules
                (guild_id, delivery_channel_id, frequency, time_of_day, day_parameter, timezone)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (guild_id)
            DO UPDATE SET
                delivery_channel_id = $2,
                frequency = $3,
                time_of_day = $4,
                day_parameter = $5,
                timezone = $6,
                updated_at = NOW()
            "#,
        )
        .bind(guild_id.get() as i64)
        .bind(delivery_channel_id.get() as i64)
        .bind(frequency)
        .bind(time_of_day)
        .bind(day_parameter)
        .bind(timezone)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Get a guild's delivery configuration
    pub async fn get_guild_schedule(
        &self,
        guild_id: GuildId,
    ) -> Result<Option<GuildScheduleConfig>, SqlxError> {
        let row: Option<ConfigRow> = sqlx::query_as(
            "SELECT guild_id, delivery_channel_id, frequency, time_of_day, day_parameter, \
             timezone, last_sent_at FROM guild_quote_schedules WHERE guild_id = $1",
        )
        .bind(guild_id.get() as i64)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(config_from_row))
    }

    /// Get every guild configuration that has a delivery channel set
    pub async fn list_with_delivery_channel(
        &self,
    ) -> Result<Vec<GuildScheduleConfig>, SqlxError> {
        let rows: Vec<ConfigRow> = sqlx::query_as(
            "SELECT guild_id, delivery_channel_id, frequency, time_of_day, day_parameter, \
             timezone, last_sent_at FROM guild_quote_schedules \
             WHERE delivery_channel_id IS NOT NULL",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(config_from_row).collect())
    }

    /// Record that a delivery was attempted for a guild at the given instant
    pub async fn update_last_sent(
        &self,
        guild_id: GuildId,
        instant: DateTime<Utc>,
    ) -> Result<(), SqlxError> {
        sqlx::query(
            "UPDATE guild_quote_schedules SET last_sent_at = $1, updated_at = NOW() \
             WHERE guild_id = $2",
        )
        .bind(instant)
        .bind(guild_id.get() as i64)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Disable delivery for a guild by clearing its channel
    /// Returns true if delivery was previously enabled
    pub async fn clear_delivery_channel(&self, guild_id: GuildId) -> Result<bool, SqlxError> {
        let result: Option<(i64,)> = sqlx::query_as(
            "UPDATE guild_quote_schedules SET delivery_channel_id = NULL, updated_at = NOW() \
             WHERE guild_id = $1 AND delivery_channel_id IS NOT NULL RETURNING guild_id",
        )
        .bind(guild_id.get() as i64)
        .fetch_optional(self.pool())
        .await?;

        Ok(result.is_some())
    }
}
