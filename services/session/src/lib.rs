//! Roster session library.
//!
//! Bridges the pure schedule model in `roster-core` to a document store:
//!
//! - **Context**: the store handle, roster and collection names, built once
//!   at start-up and passed to everything that needs them
//! - **Session**: owns one month's schedule, applies clicks optimistically
//!   and persists them in the background
//! - **Audit feed**: a live, cancellable view of the change history
//! - **View**: grid and history-toggle state for a renderer
//!
//! ## Write policy
//!
//! A click updates the in-memory schedule first. The cell patch and the
//! audit insert then run as two independent store calls on a spawned task.
//! Neither is retried and the local edit is never rolled back; callers that
//! care can await the returned [`PendingWrite`].

pub mod config;
mod error;
mod feed;
pub mod logging;
mod session;
pub mod view;

pub use config::{Collections, Config, DatabaseLocation, LogFormat};
pub use error::SessionError;
pub use feed::AuditFeed;
pub use session::{PendingWrite, RosterContext, RosterSession, WriteOutcome};
pub use view::{GridCell, GridRow, HistoryToggle, ScheduleGrid};
