//! Error types for roster construction and schedule edits.

use thiserror::Error;

/// Errors produced by the roster domain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// The month is outside 1..=12 or the year cannot be represented.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// The roster definition violates one of its rules.
    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    /// The worker has no row in the schedule.
    #[error("unknown worker: {0}")]
    UnknownWorker(String),

    /// The day is outside the schedule's month.
    #[error("day {day} out of range: schedule has {days} days")]
    DayOutOfRange { day: u32, days: u32 },
}

impl RosterError {
    /// Returns true if this error points at a cell that does not exist.
    pub fn is_missing_cell(&self) -> bool {
        matches!(
            self,
            RosterError::UnknownWorker(_) | RosterError::DayOutOfRange { .. }
        )
    }
}
