/// Log directive for the application
pub const LOG_DIRECTIVE: &str = "quotebot_rs=info";

/// Cron expression for the delivery evaluation pass (every minute)
pub const DELIVERY_TICK_CRON: &str = "0 * * * * *";

/// Cron expression for presence rotation (every five minutes)
pub const PRESENCE_ROTATION_CRON: &str = "0 */5 * * * *";

/// Job name for the delivery evaluation pass
pub const DELIVERY_JOB_NAME: &str = "quote_delivery";

/// Job name for presence rotation
pub const PRESENCE_JOB_NAME: &str = "presence_rotation";

/// Default delivery time when none is given to the setup command
pub const DEFAULT_TIME_OF_DAY: &str = "08:00";

/// Default timezone when none is given to the setup command
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Highest allowed day-of-month for monthly schedules (every month has it)
pub const MAX_MONTHLY_DAY: i32 = 28;

/// Telemetry event emitted once per delivery tick that found due guilds
pub const TELEMETRY_TICK_EVENT: &str = "quote_delivery_tick";

/// Telemetry event emitted when a recurring job fails
pub const TELEMETRY_JOB_FAILED_EVENT: &str = "recurring_job_failed";

/// Status lines cycled through the bot's presence
pub const PRESENCE_LINES: &[&str] = &[
    "Collecting wisdom 📚",
    "Delivering daily motivation ✨",
    "/setup_quotes to get started",
    "/add_quote to share yours",
];
