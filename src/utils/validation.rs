use poise::serenity_prelude::{ChannelType, GuildChannel, GuildId};
use thiserror::Error;

use crate::constants::MAX_MONTHLY_DAY;
use crate::models::Frequency;

/// Validation error types
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("This command must be used in a server")]
    NotInGuild,
    #[error("Expected {expected:?} channel, got {got:?}")]
    InvalidChannelType {
        expected: ChannelType,
        got: ChannelType,
    },
    #[error("Weekly schedules need a day between 0 (Sunday) and 6 (Saturday)")]
    InvalidWeekday,
    #[error("Monthly schedules need a day between 1 and {MAX_MONTHLY_DAY}")]
    InvalidMonthDay,
}

/// Validate that a channel is of the expected type
pub fn validate_channel_type(
    channel: &GuildChannel,
    expected: ChannelType,
) -> Result<(), ValidationError> {
    if channel.kind != expected {
        return Err(ValidationError::InvalidChannelType {
            expected,
            got: channel.kind,
        });
    }
    Ok(())
}

/// Extract guild ID from context, returning error if not in a guild
pub fn require_guild(guild_id: Option<GuildId>) -> Result<GuildId, ValidationError> {
    guild_id.ok_or(ValidationError::NotInGuild)
}

/// Range-check the day parameter for a frequency
///
/// Daily ignores the day entirely and clears it. Monthly is capped at 28 so
/// every month has the chosen day.
pub fn validate_day_parameter(
    frequency: Frequency,
    day: Option<i32>,
) -> Result<Option<i32>, ValidationError> {
    match frequency {
        Frequency::Daily => Ok(None),
        Frequency::Weekly => match day {
            Some(day) if (0..=6).contains(&day) => Ok(Some(day)),
            _ => Err(ValidationError::InvalidWeekday),
        },
        Frequency::Monthly => match day {
            Some(day) if (1..=MAX_MONTHLY_DAY).contains(&day) => Ok(Some(day)),
            _ => Err(ValidationError::InvalidMonthDay),
        },
    }
}
