/// Bot commands organized by feature
mod quote;
mod schedule;

// Re-export command functions
pub use quote::{add_quote, quote_stats};
pub use schedule::{disable_quotes, quote_schedule, setup_quotes};
