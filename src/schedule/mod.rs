/// Schedule management modules
mod delivery;
mod evaluator;
mod manager;
mod presence;
mod types;

// Re-export public types and functions
pub use manager::ScheduleManager;
pub use types::{JobError, JobKind, JobObserver, LogObserver, RecurringJob, TelemetryObserver};
