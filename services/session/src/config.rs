//! Configuration for roster sessions.
//!
//! Every setting comes from a `ROSTER_*` environment variable with a
//! default that reproduces the reference deployment.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Local};
use directories::ProjectDirs;
use roster_core::{MonthLength, Period, Roster, REFERENCE_REST_DAYS, REFERENCE_WORKERS};
use roster_docstore::{DocumentStore, MemoryStore, SqliteStore, DEFAULT_POLL_INTERVAL};

/// Database file name inside the data directory.
const DATABASE_FILE: &str = "roster.db";

/// Names of the two collections a session uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    /// One document per period, keyed by period id.
    pub schedules: String,
    /// Append-only change records.
    pub audit: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            schedules: "turnos".to_string(),
            audit: "historial".to_string(),
        }
    }
}

/// Where documents are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// Process-local, lost on exit.
    Memory,
    /// SQLite file, shared by every process that opens it.
    File(PathBuf),
}

impl DatabaseLocation {
    /// `:memory:` selects the in-process store; anything else is a path.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            ":memory:" | "memory" => Self::Memory,
            path => Self::File(PathBuf::from(path)),
        }
    }

    /// `roster.db` under the user's data directory.
    pub fn default_file() -> Result<Self> {
        ProjectDirs::from("com", "roster", "roster")
            .map(|dirs| Self::File(dirs.data_dir().join(DATABASE_FILE)))
            .ok_or_else(|| anyhow!("Could not determine data directory"))
    }
}

impl std::fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str(":memory:"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(anyhow!("unknown log format: {other}")),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseLocation,

    /// Period shown when none is given explicitly.
    pub period: Period,

    pub roster: Roster,

    pub collections: Collections,

    /// How often file-backed subscriptions re-read the database.
    pub poll_interval: Duration,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = match lookup("ROSTER_DATABASE") {
            Some(s) => DatabaseLocation::parse(&s),
            None => DatabaseLocation::default_file()?,
        };

        let period = match lookup("ROSTER_PERIOD") {
            Some(s) => s.parse::<Period>().context("invalid ROSTER_PERIOD")?,
            None => current_period()?,
        };

        let roster = roster_from_lookup(&lookup)?;

        let defaults = Collections::default();
        let collections = Collections {
            schedules: lookup("ROSTER_SCHEDULE_COLLECTION").unwrap_or(defaults.schedules),
            audit: lookup("ROSTER_AUDIT_COLLECTION").unwrap_or(defaults.audit),
        };

        let poll_interval = lookup("ROSTER_POLL_MS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        let log_level = lookup("ROSTER_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("ROSTER_LOG_FORMAT") {
            Some(s) => s.parse::<LogFormat>()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            database,
            period,
            roster,
            collections,
            poll_interval,
            log_level,
            log_format,
        })
    }

    /// Open the configured store.
    pub fn connect(&self) -> Result<Arc<dyn DocumentStore>> {
        match &self.database {
            DatabaseLocation::Memory => Ok(Arc::new(MemoryStore::new())),
            DatabaseLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create data directory {}", parent.display())
                    })?;
                }
                let store = SqliteStore::open(path)
                    .with_context(|| format!("Failed to open database {}", path.display()))?
                    .with_poll_interval(Some(self.poll_interval));
                Ok(Arc::new(store))
            }
        }
    }
}

fn current_period() -> Result<Period> {
    let today = Local::now().date_naive();
    Ok(Period::new(today.year(), today.month())?)
}

fn roster_from_lookup<F>(lookup: &F) -> Result<Roster>
where
    F: Fn(&str) -> Option<String>,
{
    let workers: Vec<String> = match lookup("ROSTER_WORKERS") {
        Some(s) => split_list(&s).map(str::to_string).collect(),
        None => REFERENCE_WORKERS.iter().map(|w| w.to_string()).collect(),
    };

    let fixed_worker = lookup("ROSTER_FIXED_WORKER")
        .or_else(|| workers.first().cloned())
        .ok_or_else(|| anyhow!("ROSTER_WORKERS is empty"))?;

    let rest_days: Vec<u32> = match lookup("ROSTER_REST_DAYS") {
        Some(s) => split_list(&s)
            .map(|d| d.parse::<u32>().with_context(|| format!("invalid rest day {d:?}")))
            .collect::<Result<_>>()?,
        None => REFERENCE_REST_DAYS.to_vec(),
    };

    let month_length = match lookup("ROSTER_MONTH_LENGTH") {
        Some(s) => s.parse::<MonthLength>().map_err(|e| anyhow!(e))?,
        None => MonthLength::default(),
    };

    Ok(Roster::new(workers, fixed_worker, rest_days)?.with_month_length(month_length))
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|part| !part.is_empty())
}
