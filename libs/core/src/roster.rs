//! Roster definition: who is scheduled and under which rules.

use std::collections::{BTreeSet, HashSet};

use crate::{Period, RosterError};

/// Workers of the reference deployment, in display order.
pub const REFERENCE_WORKERS: [&str; 11] = [
    "Yolanda",
    "Juan Carlos",
    "Diana",
    "Tato",
    "Abelardo",
    "Sebastian",
    "Maria",
    "Monica",
    "Dora",
    "Beatriz",
    "Sonia",
];

/// Mid-month Wednesdays the fixed-schedule worker rests in the reference deployment.
pub const REFERENCE_REST_DAYS: [u32; 2] = [4, 18];

/// A day needs at most four rotating slots; fewer workers would collide.
pub const MIN_ROTATING_WORKERS: usize = 4;

/// How many days a generated schedule spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthLength {
    /// The real length of the month.
    #[default]
    Calendar,
    /// A fixed number of days regardless of the month.
    ///
    /// `Fixed(30)` matches schedules created by the first version of the widget.
    Fixed(u32),
}

impl MonthLength {
    /// Days a schedule for `period` spans under this policy.
    pub fn days(&self, period: Period) -> u32 {
        match self {
            Self::Calendar => period.days_in_month(),
            Self::Fixed(days) => *days,
        }
    }
}

impl std::str::FromStr for MonthLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "calendar" => Ok(Self::Calendar),
            other => other
                .strip_prefix("fixed")
                .map(|n| n.trim_start_matches(['-', ':', '=']))
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| (1..=31).contains(n))
                .map(Self::Fixed)
                .ok_or_else(|| format!("invalid month length policy: {s:?}")),
        }
    }
}

/// The fixed set of workers and the rules that drive generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    workers: Vec<String>,
    fixed_worker: String,
    rest_days: BTreeSet<u32>,
    month_length: MonthLength,
}

impl Roster {
    /// Builds a roster, validating its rules.
    ///
    /// `workers` is the display order. The fixed-schedule worker must be one
    /// of them; the rest rotate in the order given.
    pub fn new<I, S>(
        workers: I,
        fixed_worker: impl Into<String>,
        rest_days: impl IntoIterator<Item = u32>,
    ) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let workers: Vec<String> = workers.into_iter().map(Into::into).collect();
        let fixed_worker = fixed_worker.into();
        let rest_days: BTreeSet<u32> = rest_days.into_iter().collect();

        let mut seen = HashSet::new();
        for worker in &workers {
            if worker.trim().is_empty() {
                return Err(RosterError::InvalidRoster("empty worker name".to_string()));
            }
            if worker.contains('.') {
                return Err(RosterError::InvalidRoster(format!(
                    "worker name {worker:?} contains '.'"
                )));
            }
            if !seen.insert(worker.as_str()) {
                return Err(RosterError::InvalidRoster(format!(
                    "duplicate worker {worker:?}"
                )));
            }
        }

        if !seen.contains(fixed_worker.as_str()) {
            return Err(RosterError::InvalidRoster(format!(
                "fixed-schedule worker {fixed_worker:?} is not in the roster"
            )));
        }

        let rotating = workers.len() - 1;
        if rotating < MIN_ROTATING_WORKERS {
            return Err(RosterError::InvalidRoster(format!(
                "{rotating} rotating workers, need at least {MIN_ROTATING_WORKERS}"
            )));
        }

        if let Some(day) = rest_days.iter().find(|d| !(1..=31).contains(*d)) {
            return Err(RosterError::InvalidRoster(format!("rest day {day} out of range")));
        }

        Ok(Self {
            workers,
            fixed_worker,
            rest_days,
            month_length: MonthLength::Calendar,
        })
    }

    /// The roster of the reference deployment.
    pub fn reference() -> Self {
        Self {
            workers: REFERENCE_WORKERS.iter().map(|w| w.to_string()).collect(),
            fixed_worker: REFERENCE_WORKERS[0].to_string(),
            rest_days: REFERENCE_REST_DAYS.into_iter().collect(),
            month_length: MonthLength::Calendar,
        }
    }

    /// Sets the month length policy.
    #[must_use]
    pub fn with_month_length(mut self, month_length: MonthLength) -> Self {
        self.month_length = month_length;
        self
    }

    /// All workers in display order.
    pub fn workers(&self) -> &[String] {
        &self.workers
    }

    pub fn fixed_worker(&self) -> &str {
        &self.fixed_worker
    }

    /// Workers eligible for rotation, in roster order.
    pub fn rotating_workers(&self) -> impl Iterator<Item = &str> {
        self.workers
            .iter()
            .map(String::as_str)
            .filter(move |w| *w != self.fixed_worker)
    }

    pub fn rest_days(&self) -> &BTreeSet<u32> {
        &self.rest_days
    }

    pub fn is_rest_day(&self, day: u32) -> bool {
        self.rest_days.contains(&day)
    }

    pub fn month_length(&self) -> MonthLength {
        self.month_length
    }

    /// Days a schedule for `period` spans.
    pub fn days_for(&self, period: Period) -> u32 {
        self.month_length.days(period)
    }

    pub fn contains(&self, worker: &str) -> bool {
        self.workers.iter().any(|w| w == worker)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::reference()
    }
}
