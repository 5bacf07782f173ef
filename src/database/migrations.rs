use super::Database;
use sqlx::Error as SqlxError;

impl Database {
    /// Run database migrations to create tables
    pub(super) async fn run_migrations(&self) -> Result<(), SqlxError> {
        self.create_guild_schedule_tables().await?;
        self.create_quote_tables().await?;
        self.create_job_tables().await?;
        Ok(())
    }

    async fn create_guild_schedule_tables(&self) -> Result<(), SqlxError> {
        // Create delivery_frequency enum if it doesn't exist
        sqlx::query(
            r#"
            DO $$ BEGIN
                CREATE TYPE delivery_frequency AS ENUM ('daily', 'weekly', 'monthly');
            EXCEPTION
                WHEN duplicate_object THEN NULL;
            END $$;
            "#,
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guild_quote_schedules (
                guild_id BIGINT PRIMARY KEY,
                delivery_channel_id BIGINT,
                frequency delivery_frequency NOT NULL DEFAULT 'daily',
                time_of_day TEXT NOT NULL DEFAULT '08:00',
                day_parameter INTEGER,
                timezone TEXT NOT NULL DEFAULT 'UTC',
                last_sent_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn create_quote_tables(&self) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quotes (
                id SERIAL PRIMARY KEY,
                quote_text TEXT NOT NULL,
                author TEXT,
                contributor_id BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn create_job_tables(&self) -> Result<(), SqlxError> {
        // Create job_kind enum if it doesn't exist
        sqlx::query(
            r#"
            DO $$ BEGIN
                CREATE TYPE job_kind AS ENUM ('quotedelivery', 'presencerotation');
            EXCEPTION
                WHEN duplicate_object THEN NULL;
            END $$;
            "#,
        )
        .execute(self.pool())
        .await?;

        // Recurring job definitions survive restarts; the worker reloads
        // them on every pass
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS recurring_jobs (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                job_kind job_kind NOT NULL,
                cron_expression TEXT NOT NULL,
                enabled BOOLEAN NOT NULL DEFAULT TRUE,
                last_run_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
