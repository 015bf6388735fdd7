//! Show command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use roster_session::HistoryToggle;

use crate::error::CliError;
use crate::output::{history_rows, print_json, print_output, render_grid, OutputFormat};

use super::CommandContext;

/// Show the schedule grid.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Also print the change history below the grid.
    #[arg(long)]
    history: bool,
}

impl ShowCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let session = ctx.load_session().await?;

        let mut toggle = HistoryToggle::new();
        if self.history {
            toggle.toggle();
        }

        if ctx.format == OutputFormat::Json {
            print_json(&session.schedule().to_document());
            return Ok(());
        }

        print!("{}", render_grid(&session.grid()));
        println!();

        if !toggle.is_visible() {
            println!("{}", format!("{}: roster show --history", toggle.label()).dimmed());
            return Ok(());
        }

        let mut feed = session.subscribe().await?;
        let snapshot = feed.next().await;
        feed.cancel().await;

        let records = snapshot.ok_or(CliError::FeedClosed)??;
        println!("\n{}", toggle.label().bold());
        print_output(&history_rows(&records), ctx.format);
        Ok(())
    }
}
