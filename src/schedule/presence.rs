use poise::serenity_prelude::{self as serenity, ActivityData, OnlineStatus};
use tracing::info;

use crate::constants::PRESENCE_LINES;

/// Pick the presence line for a rotation step
fn presence_line(step: usize) -> &'static str {
    PRESENCE_LINES[step % PRESENCE_LINES.len()]
}

/// Set the bot presence for this rotation step
///
/// The rotation counter is owned by the schedule worker, not module state.
pub fn rotate_presence(ctx: &serenity::Context, step: usize) {
    let line = presence_line(step);
    ctx.set_presence(Some(ActivityData::custom(line)), OnlineStatus::Online);
    info!("Presence rotated to '{}'", line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_line_wraps_around() {
        assert_eq!(presence_line(0), PRESENCE_LINES[0]);
        assert_eq!(presence_line(PRESENCE_LINES.len()), PRESENCE_LINES[0]);
        assert_eq!(presence_line(PRESENCE_LINES.len() + 1), PRESENCE_LINES[1]);
    }
}
