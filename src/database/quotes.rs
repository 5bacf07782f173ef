use super::Database;
use chrono::{DateTime, Utc};
use poise::serenity_prelude::UserId;
use sqlx::Error as SqlxError;

use crate::models::Quote;

type QuoteRow = (i32, String, Option<String>, i64, DateTime<Utc>);

fn quote_from_row(row: QuoteRow) -> Quote {
    let (id, text, author, contributor_id, created_at) = row;
    Quote {
        id,
        text,
        author,
        contributor_id: UserId::new(contributor_id as u64),
        created_at,
    }
}

impl Database {
    /// Append a quote to the pool, returning its id
    pub async fn add_quote(
        &self,
        text: &str,
        author: Option<&str>,
        contributor_id: UserId,
    ) -> Result<i32, SqlxError> {
        let row: (i32,) = sqlx::query_as(
            "INSERT INTO quotes (quote_text, author, contributor_id) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(text)
        .bind(author)
        .bind(contributor_id.get() as i64)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }

    /// Count quotes in the pool
    pub async fn count_quotes(&self) -> Result<i64, SqlxError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quotes")
            .fetch_one(self.pool())
            .await?;

        Ok(count.0)
    }

    /// Sample up to `n` quotes uniformly at random
    pub async fn sample_quotes(&self, n: i64) -> Result<Vec<Quote>, SqlxError> {
        let rows: Vec<QuoteRow> = sqlx::query_as(
            "SELECT id, quote_text, author, contributor_id, created_at \
             FROM quotes ORDER BY RANDOM() LIMIT $1",
        )
        .bind(n)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(quote_from_row).collect())
    }
}
