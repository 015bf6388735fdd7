//! Advance command.

use anyhow::Result;
use clap::Args;
use roster_session::WriteOutcome;

use crate::error::CliError;
use crate::output::{print_success, print_warning};

use super::CommandContext;

/// Advance one cell to the next shift.
#[derive(Debug, Args)]
pub struct AdvanceCommand {
    /// Worker name, as shown by `roster show`.
    worker: String,

    /// Day of month (1-based).
    day: u32,

    /// Number of steps to advance.
    #[arg(long, default_value = "1")]
    times: u32,
}

impl AdvanceCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let mut session = ctx.load_session().await?;

        for _ in 0..self.times {
            let pending = session.request_advance(&self.worker, self.day)?;
            let outcome = pending.wait().await;
            check_outcome(&outcome)?;

            let t = &outcome.transition;
            print_success(&format!(
                "{} day {}: {} -> {}",
                t.worker, t.day, t.previous, t.next
            ));
        }

        Ok(())
    }
}

fn check_outcome(outcome: &WriteOutcome) -> Result<(), CliError> {
    let t = &outcome.transition;
    match (&outcome.schedule, &outcome.audit) {
        (Ok(()), Ok(_)) => Ok(()),
        (Ok(()), Err(e)) => {
            print_warning(&format!("schedule saved but the change was not recorded: {e}"));
            Ok(())
        }
        (Err(e), _) => Err(CliError::WriteIncomplete {
            worker: t.worker.clone(),
            day: t.day,
            reason: e.to_string(),
        }),
    }
}
