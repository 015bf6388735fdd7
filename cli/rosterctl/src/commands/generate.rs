//! Generate command.

use anyhow::Result;
use clap::Args;
use roster_core::{generate, MonthLength};
use roster_session::ScheduleGrid;

use crate::output::{print_json, render_grid, OutputFormat};

use super::CommandContext;

/// Print a freshly generated schedule without touching the store.
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Month length policy: `calendar` or `fixedN` (e.g. `fixed30`).
    #[arg(long)]
    month_length: Option<MonthLength>,
}

impl GenerateCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let mut roster = ctx.config.roster.clone();
        if let Some(month_length) = self.month_length {
            roster = roster.with_month_length(month_length);
        }

        let schedule = generate(&roster, ctx.config.period);

        match ctx.format {
            OutputFormat::Json => print_json(&schedule.to_document()),
            OutputFormat::Table => print!("{}", render_grid(&ScheduleGrid::new(&schedule, &roster))),
        }
        println!();
        Ok(())
    }
}
