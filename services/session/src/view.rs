//! Presentation state for a renderer.
//!
//! Nothing here touches the store. A renderer builds a [`ScheduleGrid`]
//! from the session after every change and keeps a [`HistoryToggle`] for
//! the audit panel.

use chrono::Weekday;
use roster_core::{Period, Roster, Schedule, ShiftCode};

/// One cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    /// 1-based day of month.
    pub day: u32,
    pub code: ShiftCode,
}

impl GridCell {
    /// Background color for the cell, `#rrggbb`.
    pub fn color(&self) -> &'static str {
        self.code.color()
    }
}

/// One worker's row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub worker: String,
    /// Whether this is the roster's fixed worker.
    pub fixed: bool,
    pub cells: Vec<GridCell>,
}

/// The worker × day table as shown to a user.
///
/// Rows follow roster order. Rows loaded from the store for workers no
/// longer on the roster come last, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleGrid {
    pub period: Period,
    pub days: u32,
    /// Weekday of each day column, starting at day 1.
    pub weekdays: Vec<Weekday>,
    pub rows: Vec<GridRow>,
}

impl ScheduleGrid {
    pub fn new(schedule: &Schedule, roster: &Roster) -> Self {
        let period = schedule.period();
        let days = schedule.days();

        let extra = schedule.workers().filter(|w| !roster.contains(w));
        let mut extra: Vec<&str> = extra.collect();
        extra.sort_unstable();

        let rows = roster
            .workers()
            .iter()
            .map(String::as_str)
            .chain(extra)
            .map(|worker| GridRow {
                worker: worker.to_string(),
                fixed: worker == roster.fixed_worker(),
                cells: (1..=days)
                    .map(|day| GridCell {
                        day,
                        code: schedule.get(worker, day),
                    })
                    .collect(),
            })
            .collect();

        Self {
            period,
            days,
            weekdays: (1..=days).map(|day| period.weekday(day)).collect(),
            rows,
        }
    }

    pub fn row(&self, worker: &str) -> Option<&GridRow> {
        self.rows.iter().find(|r| r.worker == worker)
    }
}

/// Whether the audit history panel is shown. Hidden initially.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryToggle {
    visible: bool,
}

impl HistoryToggle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Label for the control that flips the panel.
    pub fn label(&self) -> &'static str {
        if self.visible {
            "Hide history"
        } else {
            "Show history"
        }
    }
}
