//! Initial schedule generation.
//!
//! The fixed-schedule worker covers the Day shift on weekdays that are not
//! rest days. Rotating workers fill the remaining slots in round-robin
//! order with a single cursor that carries over from one day to the next,
//! so the rotation keeps moving through the month instead of restarting
//! every morning.

use std::collections::BTreeMap;

use chrono::Weekday;

use crate::{Period, Roster, Schedule, ShiftCode};

const SLOTS_WITH_FIXED_WORKER: [ShiftCode; 3] =
    [ShiftCode::Evening, ShiftCode::Night, ShiftCode::Morning];

const SLOTS_WITHOUT_FIXED_WORKER: [ShiftCode; 4] = [
    ShiftCode::Day,
    ShiftCode::Evening,
    ShiftCode::Night,
    ShiftCode::Morning,
];

/// Codes handed to rotating workers on a day, in assignment order.
pub fn rotating_slots(fixed_worker_on_duty: bool) -> &'static [ShiftCode] {
    if fixed_worker_on_duty {
        &SLOTS_WITH_FIXED_WORKER
    } else {
        &SLOTS_WITHOUT_FIXED_WORKER
    }
}

fn fixed_worker_on_duty(roster: &Roster, period: Period, day: u32) -> bool {
    let weekday = !matches!(period.weekday(day), Weekday::Sat | Weekday::Sun);
    weekday && !roster.is_rest_day(day)
}

/// Generates the initial schedule for a period.
pub fn generate(roster: &Roster, period: Period) -> Schedule {
    let days = roster.days_for(period);
    let fixed = roster.fixed_worker();
    let rotating: Vec<&str> = roster.rotating_workers().collect();

    let mut rows: BTreeMap<String, Vec<ShiftCode>> = roster
        .workers()
        .iter()
        .map(|w| (w.clone(), vec![ShiftCode::Off; days as usize]))
        .collect();

    let mut cursor = 0usize;
    for day in 1..=days {
        let idx = (day - 1) as usize;
        let on_duty = fixed_worker_on_duty(roster, period, day);

        if on_duty {
            if let Some(row) = rows.get_mut(fixed) {
                row[idx] = ShiftCode::Day;
            }
        }

        let slots = rotating_slots(on_duty);
        for (i, code) in slots.iter().enumerate() {
            let worker = rotating[(cursor + i) % rotating.len()];
            if let Some(row) = rows.get_mut(worker) {
                row[idx] = *code;
            }
        }
        cursor = (cursor + slots.len()) % rotating.len();
    }

    Schedule::from_rows(period, days, rows)
}
