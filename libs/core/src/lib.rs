//! # roster-core
//!
//! Domain types and pure algorithms for the monthly shift roster.
//!
//! ## Design Principles
//!
//! - Generation is deterministic: the same roster and period always yield
//!   the same schedule
//! - Every (worker, day) cell has a value; anything missing reads as Off
//! - Change records are immutable and only ever appended
//! - Nothing in this crate performs I/O
//!
//! ## Shift Codes
//!
//! | Code | Shift   | Hours |
//! |------|---------|-------|
//! | `M`  | Morning | 05-08 |
//! | `C`  | Day     | 08-17 |
//! | `T`  | Evening | 17-20 |
//! | `N`  | Night   | 20-05 |
//! | `L`  | Off     |       |
//!
//! Manual edits walk the cycle `C → T → N → M → L → C`.

mod audit;
mod cycle;
mod error;
mod generator;
mod period;
mod roster;
mod schedule;
mod shift;

pub use audit::ChangeRecord;
pub use cycle::{advance, ShiftTransition};
pub use error::RosterError;
pub use generator::{generate, rotating_slots};
pub use period::Period;
pub use roster::{MonthLength, Roster, MIN_ROTATING_WORKERS, REFERENCE_REST_DAYS, REFERENCE_WORKERS};
pub use schedule::Schedule;
pub use shift::ShiftCode;
