/// Utility modules
pub mod message_formatter;
pub mod messages;
pub mod timezone;
pub mod validation;
