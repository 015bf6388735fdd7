//! Error handling and display for the CLI.

use colored::Colorize;
use roster_core::RosterError;
use roster_docstore::StoreError;
use roster_session::SessionError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The local edit was applied but a background write did not land.
    #[error("Change to {worker} day {day} was not fully saved: {reason}")]
    WriteIncomplete {
        worker: String,
        day: u32,
        reason: String,
    },

    #[error("Change history ended unexpectedly")]
    FeedClosed,
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(hint) = hint(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return match cli_err {
            CliError::WriteIncomplete { .. } => {
                Some("The store may be unavailable. Run `roster history` to see what was recorded.")
            }
            CliError::FeedClosed => Some("Check that the database is still reachable."),
        };
    }

    let roster_err = err
        .downcast_ref::<RosterError>()
        .or_else(|| match err.downcast_ref::<SessionError>() {
            Some(SessionError::Roster(e)) => Some(e),
            _ => None,
        });
    if let Some(roster_err) = roster_err {
        return match roster_err {
            RosterError::UnknownWorker(_) => Some("Run `roster show` to list the workers."),
            RosterError::DayOutOfRange { .. } => Some("Days run from 1 to the last day shown by `roster show`."),
            RosterError::InvalidPeriod(_) => Some("Periods are written YEAR-MONTH, e.g. 2025-6."),
            RosterError::InvalidRoster(_) => {
                Some("Check ROSTER_WORKERS, ROSTER_FIXED_WORKER and ROSTER_REST_DAYS.")
            }
        };
    }

    let store_err = err
        .downcast_ref::<StoreError>()
        .or_else(|| match err.downcast_ref::<SessionError>() {
            Some(SessionError::Store(e)) => Some(e),
            _ => None,
        });
    match store_err {
        Some(e) if e.is_transient() => {
            Some("Check the database path (--db or ROSTER_DATABASE) and try again.")
        }
        _ => None,
    }
}
