use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

use crate::models::{Frequency, GuildScheduleConfig};
use crate::utils::timezone::parse_time_string;

/// Decide whether a guild is due for a quote at `now`
///
/// Pure function over the configuration and the instant. All calendar
/// arithmetic happens in the guild's own timezone: the local date can
/// differ from the UTC date around midnight, so day-of-week and
/// day-of-month come from the zone-local clock.
///
/// The match is minute-exact, so the tick source has to fire at least once
/// per minute. A tick missed across the target minute skips the whole
/// period; there is no catch-up.
pub fn is_due(config: &GuildScheduleConfig, now: DateTime<Utc>) -> bool {
    if config.delivery_channel_id.is_none() {
        return false;
    }

    // Invalid zone or time shape should have been rejected at setup;
    // treat them as never-due rather than guessing
    let Ok(tz) = config.timezone.parse::<Tz>() else {
        return false;
    };
    let Ok(target) = parse_time_string(&config.time_of_day) else {
        return false;
    };

    let local = now.with_timezone(&tz);
    if local.hour() != target.hour() || local.minute() != target.minute() {
        return false;
    }

    match config.frequency {
        Frequency::Daily => {}
        Frequency::Weekly => {
            let weekday = local.weekday().num_days_from_sunday() as i32;
            if config.day_parameter != Some(weekday) {
                return false;
            }
        }
        Frequency::Monthly => {
            if config.day_parameter != Some(local.day() as i32) {
                return false;
            }
        }
    }

    match config.last_sent_at {
        None => true,
        Some(last) => !same_period(config.frequency, last.with_timezone(&tz), local),
    }
}

/// True when both instants fall in the same recurrence period of the
/// guild's local calendar
fn same_period(frequency: Frequency, last: DateTime<Tz>, now: DateTime<Tz>) -> bool {
    match frequency {
        Frequency::Daily => last.date_naive() == now.date_naive(),
        Frequency::Weekly => last.iso_week() == now.iso_week(),
        Frequency::Monthly => last.year() == now.year() && last.month() == now.month(),
    }
}
