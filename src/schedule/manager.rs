use chrono::Utc;
use poise::serenity_prelude as serenity;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

use super::delivery::run_delivery_pass;
use super::presence::rotate_presence;
use super::types::{JobError, JobKind, JobObserver, RecurringJob};
use crate::models::Data;

/// A job definition with its recurrence parsed and validated
///
/// Parsing happens once per load from the database, never per tick.
struct LoadedJob {
    job: RecurringJob,
    schedule: cron::Schedule,
}

impl LoadedJob {
    fn parse(job: RecurringJob) -> Option<LoadedJob> {
        match cron::Schedule::from_str(&job.cron_expression) {
            Ok(schedule) => Some(LoadedJob { job, schedule }),
            Err(e) => {
                error!(
                    "Invalid cron expression '{}' for job '{}': {}",
                    job.cron_expression, job.name, e
                );
                None
            }
        }
    }
}

/// The schedule worker: a single consumer running recurring jobs serially
///
/// Serial execution is the only concurrency control the schedule records
/// need: `last_sent_at` written by one delivery pass is always visible to
/// the next. Job definitions live in the database, so the cadence survives
/// restarts.
pub struct ScheduleManager {
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ScheduleManager {
    /// Start the worker task
    pub fn start(
        ctx: serenity::Context,
        data: Arc<Data>,
        observers: Vec<Arc<dyn JobObserver>>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(worker_loop(ctx, data, observers, shutdown_rx));
        Self {
            shutdown_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Signal the worker to stop and wait for it to finish
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
    }
}

async fn worker_loop(
    ctx: serenity::Context,
    data: Arc<Data>,
    observers: Vec<Arc<dyn JobObserver>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("Schedule worker started");

    let Some(jobs) = load_jobs(&data, &mut shutdown_rx).await else {
        info!("Schedule worker stopped");
        return;
    };

    let mut presence_step: usize = 0;
    loop {
        match next_due_jobs(&jobs, Utc::now()) {
            Some((due, wait)) => {
                tokio::select! {
                    _ = sleep(wait) => {
                        // Still serial: colliding jobs run one after another
                        // within the same wake-up
                        for job in &due {
                            run_job(&ctx, &data, &observers, job, &mut presence_step).await;
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            None => {
                warn!("No runnable job definitions; schedule worker idle");
                let _ = shutdown_rx.changed().await;
                break;
            }
        }
    }

    info!("Schedule worker stopped");
}

/// Load enabled job definitions, parsing each cron expression exactly once
///
/// Retries every minute while the store is unavailable; returns None when
/// shutdown is signalled first.
async fn load_jobs(
    data: &Data,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> Option<Vec<LoadedJob>> {
    loop {
        match data.db.get_all_jobs().await {
            Ok(jobs) => {
                return Some(
                    jobs.into_iter()
                        .filter(|job| job.enabled)
                        .filter_map(LoadedJob::parse)
                        .collect(),
                );
            }
            Err(e) => {
                error!("Failed to load job definitions: {}", e);
                tokio::select! {
                    _ = sleep(Duration::from_secs(60)) => {}
                    _ = shutdown_rx.changed() => return None,
                }
            }
        }
    }
}

/// Find every job due at the nearest upcoming fire instant and how long
/// to wait for it
///
/// Schedules can share a fire instant (an every-minute job fires whenever
/// an every-five-minutes job does); all of them must run in that wake-up,
/// otherwise the tie-loser slips past every shared boundary and starves.
fn next_due_jobs(
    jobs: &[LoadedJob],
    now: chrono::DateTime<Utc>,
) -> Option<(Vec<RecurringJob>, Duration)> {
    let upcoming: Vec<(chrono::DateTime<Utc>, &LoadedJob)> = jobs
        .iter()
        .filter_map(|loaded| loaded.schedule.after(&now).next().map(|next| (next, loaded)))
        .collect();

    let earliest = upcoming.iter().map(|(next, _)| *next).min()?;
    let due = upcoming
        .into_iter()
        .filter(|(next, _)| *next == earliest)
        .map(|(_, loaded)| loaded.job.clone())
        .collect();
    let wait = (earliest - now).to_std().unwrap_or(Duration::from_secs(0));

    Some((due, wait))
}

/// Run one job and publish its outcome to the observers
///
/// A failed run is not retried here; the job's own cadence produces the
/// next attempt.
async fn run_job(
    ctx: &serenity::Context,
    data: &Arc<Data>,
    observers: &[Arc<dyn JobObserver>],
    job: &RecurringJob,
    presence_step: &mut usize,
) {
    let started_at = Utc::now();

    let result: Result<(), JobError> = match job.kind {
        JobKind::QuoteDelivery => run_delivery_pass(&ctx.http, data).await.map(|summary| {
            if summary.due > 0 {
                info!(
                    "Delivery tick: {} due, {} succeeded, {} failed, {} skipped",
                    summary.due, summary.succeeded, summary.failed, summary.skipped
                );
            }
        }),
        JobKind::PresenceRotation => {
            rotate_presence(ctx, *presence_step);
            *presence_step += 1;
            Ok(())
        }
    };

    if let Err(e) = data.db.touch_job_run(job.id, started_at).await {
        warn!("Failed to record run of job '{}': {}", job.name, e);
    }

    match result {
        Ok(()) => {
            for observer in observers {
                observer.completed(job);
            }
        }
        Err(e) => {
            for observer in observers {
                observer.failed(job, &e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn job(id: i32, name: &str, cron_expression: &str) -> RecurringJob {
        RecurringJob {
            id,
            name: name.to_string(),
            kind: JobKind::QuoteDelivery,
            cron_expression: cron_expression.to_string(),
            enabled: true,
            last_run_at: None,
        }
    }

    fn minutely_and_five_minutely() -> Vec<LoadedJob> {
        vec![
            LoadedJob::parse(job(1, "minutely", "0 * * * * *")).unwrap(),
            LoadedJob::parse(job(2, "five-minutely", "0 */5 * * * *")).unwrap(),
        ]
    }

    #[test]
    fn test_parse_rejects_invalid_cron() {
        assert!(LoadedJob::parse(job(1, "bad", "not a cron")).is_none());
        assert!(LoadedJob::parse(job(2, "good", "0 * * * * *")).is_some());
    }

    #[test]
    fn test_next_due_jobs_prefers_nearest() {
        let loaded: Vec<LoadedJob> = vec![
            LoadedJob::parse(job(1, "minutely", "0 * * * * *")).unwrap(),
            // Once a year, far in the future from any instant
            LoadedJob::parse(job(2, "yearly", "0 0 0 1 1 *")).unwrap(),
        ];

        let now = Utc.with_ymd_and_hms(2025, 6, 15, 8, 4, 30).unwrap();
        let (due, wait) = next_due_jobs(&loaded, now).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].name, "minutely");
        assert_eq!(wait, Duration::from_secs(30));
    }

    #[test]
    fn test_next_due_jobs_returns_all_colliding_jobs() {
        let loaded = minutely_and_five_minutely();

        // 08:05:00 is a fire instant for both expressions
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 8, 4, 0).unwrap();
        let (due, wait) = next_due_jobs(&loaded, now).unwrap();
        let names: Vec<&str> = due.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(wait, Duration::from_secs(60));
        assert!(names.contains(&"minutely"));
        assert!(names.contains(&"five-minutely"));
    }

    #[test]
    fn test_neither_job_starves_over_many_wakeups() {
        let loaded = minutely_and_five_minutely();

        // Walk twelve hours of wake-ups the way the worker loop does:
        // sleep to the next instant, run what is due, repeat from there
        let mut now = Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 30).unwrap();
        let mut minutely_runs = 0u32;
        let mut five_minutely_runs = 0u32;
        for _ in 0..720 {
            let (due, wait) = next_due_jobs(&loaded, now).unwrap();
            for job in &due {
                match job.name.as_str() {
                    "minutely" => minutely_runs += 1,
                    "five-minutely" => five_minutely_runs += 1,
                    other => panic!("unexpected job {other}"),
                }
            }
            now += chrono::Duration::from_std(wait).unwrap() + chrono::Duration::seconds(1);
        }

        assert_eq!(minutely_runs, 720);
        assert_eq!(five_minutely_runs, 144);
    }

    #[test]
    fn test_next_due_jobs_empty() {
        assert!(next_due_jobs(&[], Utc::now()).is_none());
    }
}
