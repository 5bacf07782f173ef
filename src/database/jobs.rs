use super::Database;
use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;

use crate::constants::{
    DELIVERY_JOB_NAME, DELIVERY_TICK_CRON, PRESENCE_JOB_NAME, PRESENCE_ROTATION_CRON,
};
use crate::schedule::{JobKind, RecurringJob};

type JobRow = (i32, String, JobKind, String, bool, Option<DateTime<Utc>>);

fn job_from_row(row: JobRow) -> RecurringJob {
    let (id, name, kind, cron_expression, enabled, last_run_at) = row;
    RecurringJob {
        id,
        name,
        kind,
        cron_expression,
        enabled,
        last_run_at,
    }
}

impl Database {
    /// Get all recurring job definitions
    pub async fn get_all_jobs(&self) -> Result<Vec<RecurringJob>, SqlxError> {
        let rows: Vec<JobRow> = sqlx::query_as(
            "SELECT id, name, job_kind, cron_expression, enabled, last_run_at \
             FROM recurring_jobs",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(job_from_row).collect())
    }

    /// Seed the default job definitions if they are missing
    ///
    /// Existing rows are left untouched so operator edits to cadence or
    /// enabled state survive restarts.
    pub async fn ensure_default_jobs(&self) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            INSERT INTO recurring_jobs (name, job_kind, cron_expression)
            VALUES ($1, 'quotedelivery', $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(DELIVERY_JOB_NAME)
        .bind(DELIVERY_TICK_CRON)
        .execute(self.pool())
        .await?;

        sqlx::query(
            r#"
            INSERT INTO recurring_jobs (name, job_kind, cron_expression)
            VALUES ($1, 'presencerotation', $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(PRESENCE_JOB_NAME)
        .bind(PRESENCE_ROTATION_CRON)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Record when a job last ran
    pub async fn touch_job_run(
        &self,
        job_id: i32,
        instant: DateTime<Utc>,
    ) -> Result<(), SqlxError> {
        sqlx::query(
            "UPDATE recurring_jobs SET last_run_at = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(instant)
        .bind(job_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
