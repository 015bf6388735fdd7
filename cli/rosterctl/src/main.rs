//! rosterctl (roster) - terminal front-end for the monthly shift roster.
//!
//! Shows the schedule as a colored grid, advances cells and follows the
//! change history.

use anyhow::Result;
use clap::Parser;

mod commands;
mod error;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
