//! Single-step shift advancement.
//!
//! Each click moves a cell one step along `C → T → N → M → L → C`.
//! There is no terminal state.

use crate::{RosterError, Schedule, ShiftCode};

/// The result of advancing one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftTransition {
    pub worker: String,
    /// 1-based day of month.
    pub day: u32,
    pub previous: ShiftCode,
    pub next: ShiftCode,
}

impl ShiftTransition {
    /// Store field path of the changed cell.
    pub fn field_path(&self) -> String {
        Schedule::field_path(&self.worker, self.day)
    }
}

/// Advances the cell for `worker` on `day` to the next code in the cycle.
///
/// The schedule is updated in place. Fails only when the cell does not exist.
pub fn advance(
    schedule: &mut Schedule,
    worker: &str,
    day: u32,
) -> Result<ShiftTransition, RosterError> {
    schedule.check_cell(worker, day)?;

    let previous = schedule.get(worker, day);
    let next = previous.next();
    schedule.set(worker, day, next)?;

    Ok(ShiftTransition {
        worker: worker.to_string(),
        day,
        previous,
        next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generate, Period, Roster};
    use proptest::prelude::*;

    fn june_schedule() -> Schedule {
        generate(&Roster::reference(), Period::new(2025, 6).unwrap())
    }

    #[test]
    fn test_night_becomes_morning() {
        let mut schedule = june_schedule();
        assert_eq!(schedule.get("Tato", 1), ShiftCode::Night);

        let transition = advance(&mut schedule, "Tato", 1).unwrap();
        assert_eq!(transition.previous, ShiftCode::Night);
        assert_eq!(transition.next, ShiftCode::Morning);
        assert_eq!(transition.field_path(), "Tato.0");
        assert_eq!(schedule.get("Tato", 1), ShiftCode::Morning);
    }

    #[test]
    fn test_off_wraps_to_day() {
        let mut schedule = june_schedule();
        assert_eq!(schedule.get("Sonia", 1), ShiftCode::Off);
        let transition = advance(&mut schedule, "Sonia", 1).unwrap();
        assert_eq!(transition.next, ShiftCode::Day);
    }

    #[test]
    fn test_only_target_cell_changes() {
        let original = june_schedule();
        let mut schedule = original.clone();
        advance(&mut schedule, "Diana", 10).unwrap();

        for worker in Roster::reference().workers() {
            for day in 1..=schedule.days() {
                if worker == "Diana" && day == 10 {
                    continue;
                }
                assert_eq!(schedule.get(worker, day), original.get(worker, day));
            }
        }
    }

    #[test]
    fn test_missing_cell_is_rejected() {
        let mut schedule = june_schedule();
        let before = schedule.clone();

        assert!(advance(&mut schedule, "Nobody", 1).unwrap_err().is_missing_cell());
        assert!(advance(&mut schedule, "Diana", 0).unwrap_err().is_missing_cell());
        assert!(advance(&mut schedule, "Diana", 31).unwrap_err().is_missing_cell());
        assert_eq!(schedule, before);
    }

    fn any_code() -> impl Strategy<Value = ShiftCode> {
        prop::sample::select(ShiftCode::CYCLE.to_vec())
    }

    proptest! {
        #[test]
        fn prop_cycle_length_is_five(start in any_code(), day in 1u32..=30, worker_idx in 0usize..11) {
            let mut schedule = june_schedule();
            let worker = Roster::reference().workers()[worker_idx].clone();
            schedule.set(&worker, day, start).unwrap();

            let mut seen = Vec::new();
            for _ in 0..5 {
                seen.push(advance(&mut schedule, &worker, day).unwrap().next);
            }

            prop_assert_eq!(schedule.get(&worker, day), start);
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), 5);
        }
    }
}
