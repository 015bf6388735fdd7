//! CLI commands.

mod advance;
mod generate;
mod history;
mod show;
mod watch;

use anyhow::Result;
use clap::{Parser, Subcommand};
use roster_core::Period;
use roster_session::{logging, Config, RosterContext, RosterSession};
use tracing::debug;

use crate::output::OutputFormat;

/// roster - view and edit the monthly shift roster.
#[derive(Debug, Parser)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Month to work on, as YEAR-MONTH (defaults to the current month).
    #[arg(long, global = true)]
    period: Option<Period>,

    /// Database file, or `:memory:` for a throwaway store.
    #[arg(long, global = true, env = "ROSTER_DATABASE")]
    db: Option<String>,

    /// Log level for diagnostics on stderr.
    #[arg(long, global = true, env = "ROSTER_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the schedule grid.
    Show(show::ShowCommand),

    /// Advance one cell to the next shift.
    Advance(advance::AdvanceCommand),

    /// Print the change history once.
    History(history::HistoryCommand),

    /// Follow the change history until Ctrl-C.
    Watch(watch::WatchCommand),

    /// Print a freshly generated schedule without touching the store.
    Generate(generate::GenerateCommand),
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let format = match self.format.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        };

        let mut config = load_config(self.db.as_deref(), self.period, |key| {
            std::env::var(key).ok()
        })?;
        config.log_level = self.log_level;

        logging::init_tracing(&config.log_level, config.log_format)?;
        debug!(database = %config.database, period = %config.period, "Configuration loaded");

        let ctx = CommandContext { config, format };

        match self.command {
            Commands::Show(cmd) => cmd.run(ctx).await,
            Commands::Advance(cmd) => cmd.run(ctx).await,
            Commands::History(cmd) => cmd.run(ctx).await,
            Commands::Watch(cmd) => cmd.run(ctx).await,
            Commands::Generate(cmd) => cmd.run(ctx),
        }
    }
}

/// Build the configuration with command-line flags taking precedence.
///
/// The flags are fed in as lookups so their defaults are never resolved
/// when a flag is given.
fn load_config<F>(db: Option<&str>, period: Option<Period>, env: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    Config::from_lookup(|key| match key {
        "ROSTER_DATABASE" => db.map(str::to_string).or_else(|| env(key)),
        "ROSTER_PERIOD" => period.map(|p| p.to_string()).or_else(|| env(key)),
        _ => env(key),
    })
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Open the configured store and build a roster context on it.
    pub fn roster_context(&self) -> Result<RosterContext> {
        let store = self.config.connect()?;
        Ok(RosterContext::new(store, self.config.roster.clone())
            .with_collections(self.config.collections.clone()))
    }

    /// Load the session for the selected period.
    pub async fn load_session(&self) -> Result<RosterSession> {
        let session = self.roster_context()?.load(self.config.period).await?;
        Ok(session)
    }
}
