//! The worker × day assignment table for one period.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{Period, Roster, RosterError, ShiftCode};

/// Shift assignments for every worker on every day of a period.
///
/// Rows are keyed by worker name. Reads of a missing row or day return
/// [`ShiftCode::Off`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    period: Period,
    days: u32,
    rows: BTreeMap<String, Vec<ShiftCode>>,
}

impl Schedule {
    /// A schedule with every roster worker Off on every day.
    pub fn empty(roster: &Roster, period: Period) -> Self {
        let days = roster.days_for(period);
        let rows = roster
            .workers()
            .iter()
            .map(|w| (w.clone(), vec![ShiftCode::Off; days as usize]))
            .collect();

        Self { period, days, rows }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Number of day columns.
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Worker names with a row, in name order.
    pub fn workers(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn has_worker(&self, worker: &str) -> bool {
        self.rows.contains_key(worker)
    }

    /// The full row of a worker.
    pub fn row(&self, worker: &str) -> Option<&[ShiftCode]> {
        self.rows.get(worker).map(Vec::as_slice)
    }

    /// Code of a cell; 1-based day.
    pub fn get(&self, worker: &str, day: u32) -> ShiftCode {
        day.checked_sub(1)
            .and_then(|idx| self.rows.get(worker)?.get(idx as usize))
            .copied()
            .unwrap_or(ShiftCode::Off)
    }

    /// Overwrites a cell; 1-based day.
    pub fn set(&mut self, worker: &str, day: u32, code: ShiftCode) -> Result<(), RosterError> {
        self.check_cell(worker, day)?;
        let row = self
            .rows
            .get_mut(worker)
            .ok_or_else(|| RosterError::UnknownWorker(worker.to_string()))?;
        row[(day - 1) as usize] = code;
        Ok(())
    }

    /// Errors unless (worker, day) addresses an existing cell.
    pub fn check_cell(&self, worker: &str, day: u32) -> Result<(), RosterError> {
        if !self.rows.contains_key(worker) {
            return Err(RosterError::UnknownWorker(worker.to_string()));
        }
        if day == 0 || day > self.days {
            return Err(RosterError::DayOutOfRange {
                day,
                days: self.days,
            });
        }
        Ok(())
    }

    /// Workers holding a shift on a day, with their codes.
    pub fn working_on(&self, day: u32) -> Vec<(&str, ShiftCode)> {
        self.rows
            .keys()
            .map(|w| (w.as_str(), self.get(w, day)))
            .filter(|(_, code)| code.is_working())
            .collect()
    }

    /// Store field path addressing a cell: `"<worker>.<day - 1>"`.
    pub fn field_path(worker: &str, day: u32) -> String {
        format!("{}.{}", worker, day.saturating_sub(1))
    }

    /// Encodes the schedule as a store document: worker name → array of codes.
    pub fn to_document(&self) -> Map<String, Value> {
        self.rows
            .iter()
            .map(|(worker, row)| {
                let codes = row
                    .iter()
                    .map(|c| Value::String(c.code().to_string()))
                    .collect();
                (worker.clone(), Value::Array(codes))
            })
            .collect()
    }

    /// Decodes a persisted document, normalising it against the roster.
    ///
    /// - The day count is the longest persisted row, or the roster's length
    ///   for the period when the document has no rows
    /// - Short rows, missing roster workers and unknown codes become Off
    /// - Rows of workers outside the roster are kept
    pub fn from_document(period: Period, document: &Map<String, Value>, roster: &Roster) -> Self {
        let mut rows: BTreeMap<String, Vec<ShiftCode>> = document
            .iter()
            .map(|(worker, value)| (worker.clone(), decode_row(value)))
            .collect();

        let days = rows
            .values()
            .map(|row| row.len() as u32)
            .max()
            .filter(|d| *d > 0)
            .unwrap_or_else(|| roster.days_for(period));

        for worker in roster.workers() {
            rows.entry(worker.clone()).or_default();
        }
        for row in rows.values_mut() {
            row.resize(days as usize, ShiftCode::Off);
        }

        Self { period, days, rows }
    }

    pub(crate) fn from_rows(
        period: Period,
        days: u32,
        rows: BTreeMap<String, Vec<ShiftCode>>,
    ) -> Self {
        Self { period, days, rows }
    }
}

/// No month has more days than this; stored cells past it are ignored.
const MAX_DAYS: usize = 31;

fn decode_row(value: &Value) -> Vec<ShiftCode> {
    match value {
        Value::Array(items) => items
            .iter()
            .take(MAX_DAYS)
            .map(ShiftCode::from_stored)
            .collect(),
        // A row patched through a map-style field path: {"0": "C", "3": "N"}.
        Value::Object(map) => {
            let mut row = Vec::new();
            for (key, code) in map {
                let Some(idx) = key.parse::<usize>().ok().filter(|i| *i < MAX_DAYS) else {
                    continue;
                };
                if idx >= row.len() {
                    row.resize(idx + 1, ShiftCode::Off);
                }
                row[idx] = ShiftCode::from_stored(code);
            }
            row
        }
        _ => Vec::new(),
    }
}
