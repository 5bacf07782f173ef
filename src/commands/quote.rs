use tracing::{error, info};

use crate::{
    models::{Context, Error},
    utils::messages::{build_database_error, format_info, format_success},
};

/// Add a quote to the delivery pool
#[poise::command(slash_command)]
pub async fn add_quote(
    ctx: Context<'_>,
    #[description = "The quote text"] text: String,
    #[description = "Who said it (optional)"] author: Option<String>,
) -> Result<(), Error> {
    let contributor_id = ctx.author().id;

    match ctx
        .data()
        .db
        .add_quote(&text, author.as_deref(), contributor_id)
        .await
    {
        Ok(id) => {
            info!("Quote {} added by user {}", id, contributor_id);
            ctx.say(format_success("Quote added to the pool!")).await?;
        }
        Err(e) => {
            error!("Failed to add quote from user {}: {}", contributor_id, e);
            ctx.say(build_database_error()).await?;
        }
    }

    Ok(())
}

/// Show how many quotes are in the delivery pool
#[poise::command(slash_command)]
pub async fn quote_stats(ctx: Context<'_>) -> Result<(), Error> {
    match ctx.data().db.count_quotes().await {
        Ok(count) => {
            ctx.say(format_info(&format!("{} quote(s) in the pool.", count)))
                .await?;
        }
        Err(e) => {
            error!("Failed to count quotes: {}", e);
            ctx.say(build_database_error()).await?;
        }
    }

    Ok(())
}
