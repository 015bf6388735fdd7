//! Watch command (tail the change history).

use anyhow::Result;
use chrono::Local;
use clap::Args;
use colored::Colorize;
use roster_session::AuditFeed;
use tracing::debug;

use crate::error::CliError;
use crate::output::{history_rows, print_output, OutputFormat};

use super::CommandContext;

/// Follow the change history until Ctrl-C.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Show at most this many records per update, newest first.
    #[arg(long, default_value = "20")]
    limit: usize,
}

impl WatchCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let mut feed = ctx
            .roster_context()?
            .subscribe(ctx.config.period)
            .await?;

        if ctx.format == OutputFormat::Table {
            println!(
                "{}",
                format!("Watching changes for {} (Ctrl-C to stop)", feed.period()).dimmed()
            );
        }

        let result = follow(&mut feed, self.limit, ctx.format).await;
        feed.cancel().await;
        result
    }
}

async fn follow(feed: &mut AuditFeed, limit: usize, format: OutputFormat) -> Result<()> {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, stopping watch");
                return Ok(());
            }
            snapshot = feed.next() => {
                let mut records = snapshot.ok_or(CliError::FeedClosed)??;
                records.truncate(limit);

                if format == OutputFormat::Table {
                    println!(
                        "\n{}",
                        format!("Updated {}", Local::now().format("%H:%M:%S")).bold()
                    );
                }
                print_output(&history_rows(&records), format);
            }
        }
    }
}
