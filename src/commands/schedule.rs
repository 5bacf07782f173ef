use poise::serenity_prelude::{ChannelType, GuildChannel};
use tracing::{error, info};

use crate::{
    constants::{DEFAULT_TIME_OF_DAY, DEFAULT_TIMEZONE},
    models::{Context, Error, Frequency},
    utils::messages::{build_database_error, format_error, format_info, format_success},
    utils::timezone::{parse_time_string, parse_timezone},
    utils::validation::{require_guild, validate_channel_type, validate_day_parameter},
};

/// Configure scheduled quote delivery for this server
#[poise::command(slash_command, required_permissions = "MANAGE_GUILD")]
pub async fn setup_quotes(
    ctx: Context<'_>,
    #[description = "Channel where quotes will be delivered"] channel: GuildChannel,
    #[description = "How often to deliver a quote"] frequency: Frequency,
    #[description = "Delivery time (HH:MM, 24-hour format, default: 08:00)"] time: Option<String>,
    #[description = "IANA timezone, e.g. America/Chicago (default: UTC)"] timezone: Option<String>,
    #[description = "Day of week (0=Sunday..6=Saturday) for weekly, day of month (1-28) for monthly"]
    day: Option<i32>,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    if let Err(e) = validate_channel_type(&channel, ChannelType::Text) {
        ctx.say(format_error(&e.to_string())).await?;
        return Ok(());
    }

    let time_str = time.unwrap_or_else(|| DEFAULT_TIME_OF_DAY.to_string());
    if let Err(e) = parse_time_string(&time_str) {
        ctx.say(format_error(&e.to_string())).await?;
        return Ok(());
    }

    let tz_str = timezone.unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    if let Err(e) = parse_timezone(&tz_str) {
        ctx.say(format_error(&e.to_string())).await?;
        return Ok(());
    }

    let day_parameter = match validate_day_parameter(frequency, day) {
        Ok(day) => day,
        Err(e) => {
            ctx.say(format_error(&e.to_string())).await?;
            return Ok(());
        }
    };

    if let Err(e) = ctx
        .data()
        .db
        .upsert_guild_schedule(
            guild_id,
            channel.id,
            frequency,
            &time_str,
            day_parameter,
            &tz_str,
        )
        .await
    {
        error!("Failed to save quote schedule for guild {}: {}", guild_id, e);
        ctx.say(build_database_error()).await?;
        return Ok(());
    }

    info!(
        "Quote schedule for guild {}: {:?} at {} {} in channel {}",
        guild_id, frequency, time_str, tz_str, channel.id
    );

    let when = match (frequency, day_parameter) {
        (Frequency::Daily, _) => format!("every day at {}", time_str),
        (Frequency::Weekly, Some(day)) => format!("every week on day {} at {}", day, time_str),
        (Frequency::Monthly, Some(day)) => format!("on day {} of every month at {}", day, time_str),
        _ => format!("at {}", time_str),
    };
    ctx.say(format_success(&format!(
        "Quotes will be delivered to {} {} ({}).",
        channel, when, tz_str
    )))
    .await?;

    Ok(())
}

/// Show this server's quote delivery schedule
#[poise::command(slash_command, required_permissions = "MANAGE_GUILD")]
pub async fn quote_schedule(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    match ctx.data().db.get_guild_schedule(guild_id).await {
        Ok(Some(config)) => {
            let status = match config.delivery_channel_id {
                Some(channel_id) => format!(
                    "Delivering {:?} quotes at {} ({}) to <#{}>.",
                    config.frequency, config.time_of_day, config.timezone, channel_id
                ),
                None => "Quote delivery is currently disabled.".to_string(),
            };
            ctx.say(format_info(&status)).await?;
        }
        Ok(None) => {
            ctx.say(format_info(
                "No quote schedule configured. Use /setup_quotes to create one.",
            ))
            .await?;
        }
        Err(e) => {
            error!("Failed to load schedule for guild {}: {}", guild_id, e);
            ctx.say(build_database_error()).await?;
        }
    }

    Ok(())
}

/// Stop scheduled quote delivery for this server
#[poise::command(slash_command, required_permissions = "MANAGE_GUILD")]
pub async fn disable_quotes(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    match ctx.data().db.clear_delivery_channel(guild_id).await {
        Ok(true) => {
            info!("Quote delivery disabled for guild {}", guild_id);
            ctx.say(format_success("Quote delivery disabled.")).await?;
        }
        Ok(false) => {
            ctx.say(format_info("Quote delivery was not enabled.")).await?;
        }
        Err(e) => {
            error!("Failed to disable quotes for guild {}: {}", guild_id, e);
            ctx.say(build_database_error()).await?;
        }
    }

    Ok(())
}
