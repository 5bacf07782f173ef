use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::constants::TELEMETRY_JOB_FAILED_EVENT;
use crate::telemetry::TelemetrySink;

/// Kind of recurring job
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "job_kind", rename_all = "lowercase")]
pub enum JobKind {
    QuoteDelivery,
    PresenceRotation,
}

/// A recurring job definition loaded from the database
#[derive(Debug, Clone)]
pub struct RecurringJob {
    pub id: i32,
    pub name: String,
    pub kind: JobKind,
    /// Cron expression with seconds field (e.g. "0 * * * * *" for every minute)
    pub cron_expression: String,
    pub enabled: bool,
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Errors that fail an entire job run
#[derive(Debug, Error)]
pub enum JobError {
    /// The quote pool was empty while guilds were due; the whole tick is
    /// aborted with no sends and no bookkeeping
    #[error("no quotes available for delivery")]
    NoContentAvailable,
    /// A store query failed before any sends happened
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Per-recipient delivery failures, isolated at the dispatcher boundary
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// Channel missing, not text-capable, or a direct-message channel
    #[error("channel resolution failed: {0}")]
    Resolution(String),
    /// The send call itself was rejected
    #[error("send failed: {0}")]
    Transport(String),
}

/// Observes the outcome of each recurring job run
///
/// Jobs fire and their outcomes are observed asynchronously; a failed run
/// is not retried, the job's own cadence produces the next attempt.
pub trait JobObserver: Send + Sync {
    fn completed(&self, job: &RecurringJob);
    fn failed(&self, job: &RecurringJob, error: &JobError);
}

/// Observer that writes job outcomes to the log
pub struct LogObserver;

impl JobObserver for LogObserver {
    fn completed(&self, job: &RecurringJob) {
        info!("Job '{}' (id {}) completed", job.name, job.id);
    }

    fn failed(&self, job: &RecurringJob, error: &JobError) {
        error!("Job '{}' (id {}) failed: {}", job.name, job.id, error);
    }
}

/// Observer that forwards job failures to the telemetry sink
pub struct TelemetryObserver {
    sink: Arc<dyn TelemetrySink>,
}

impl TelemetryObserver {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink }
    }
}

impl JobObserver for TelemetryObserver {
    fn completed(&self, _job: &RecurringJob) {}

    fn failed(&self, job: &RecurringJob, error: &JobError) {
        self.sink.capture(
            TELEMETRY_JOB_FAILED_EVENT,
            serde_json::json!({
                "job": job.name,
                "job_id": job.id,
                "error": error.to_string(),
            }),
        );
    }
}
