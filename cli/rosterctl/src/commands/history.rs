//! History command.

use anyhow::Result;
use clap::Args;

use crate::error::CliError;
use crate::output::{history_rows, print_output};

use super::CommandContext;

/// Print the change history once.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Show at most this many records, newest first.
    #[arg(long)]
    limit: Option<usize>,
}

impl HistoryCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let mut feed = ctx
            .roster_context()?
            .subscribe(ctx.config.period)
            .await?;
        let snapshot = feed.next().await;
        feed.cancel().await;

        let mut records = snapshot.ok_or(CliError::FeedClosed)??;
        if let Some(limit) = self.limit {
            records.truncate(limit);
        }

        print_output(&history_rows(&records), ctx.format);
        Ok(())
    }
}
