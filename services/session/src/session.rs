//! Roster session: one month's schedule bound to a store.

use std::sync::Arc;

use chrono::Utc;
use roster_core::{advance, generate, ChangeRecord, Period, Roster, Schedule, ShiftTransition};
use roster_docstore::{Direction, Document, DocumentStore, Query, StoreError};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{AuditFeed, Collections, ScheduleGrid, SessionError};

/// Field audit records are ordered by.
const AUDIT_ORDER_FIELD: &str = "fecha";

/// Everything a session needs from the outside world.
///
/// Built once at start-up; cloning shares the same store handle.
#[derive(Clone)]
pub struct RosterContext {
    store: Arc<dyn DocumentStore>,
    roster: Arc<Roster>,
    collections: Collections,
}

impl RosterContext {
    pub fn new(store: Arc<dyn DocumentStore>, roster: Roster) -> Self {
        Self {
            store,
            roster: Arc::new(roster),
            collections: Collections::default(),
        }
    }

    #[must_use]
    pub fn with_collections(mut self, collections: Collections) -> Self {
        self.collections = collections;
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Load the schedule for `period`, generating and persisting it on first use.
    pub async fn load(&self, period: Period) -> Result<RosterSession, SessionError> {
        let id = period.document_id();
        let existing = self
            .store
            .get_document(&self.collections.schedules, &id)
            .await?;

        let schedule = match existing {
            Some(document) => {
                let schedule = Schedule::from_document(period, &document, &self.roster);
                info!(period = %period, days = schedule.days(), "Loaded schedule");
                schedule
            }
            None => {
                let schedule = generate(&self.roster, period);
                self.store
                    .set_document(&self.collections.schedules, &id, schedule.to_document())
                    .await?;
                info!(period = %period, days = schedule.days(), "Generated initial schedule");
                schedule
            }
        };

        Ok(RosterSession::new(self.clone(), schedule))
    }

    /// Live audit history for `period`, newest first.
    pub async fn subscribe(&self, period: Period) -> Result<AuditFeed, SessionError> {
        let query = Query::collection(self.collections.audit.clone())
            .order_by(AUDIT_ORDER_FIELD, Direction::Descending);
        let subscription = self.store.subscribe_query(query).await?;

        debug!(period = %period, collection = %self.collections.audit, "Audit feed opened");
        Ok(AuditFeed::new(period, subscription))
    }
}

impl std::fmt::Debug for RosterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterContext")
            .field("roster", &self.roster)
            .field("collections", &self.collections)
            .finish_non_exhaustive()
    }
}

/// The result of the background writes for one click.
#[derive(Debug)]
pub struct WriteOutcome {
    pub transition: ShiftTransition,
    /// Patch of the schedule cell.
    pub schedule: Result<(), StoreError>,
    /// Insert of the audit record; the new record's id on success.
    pub audit: Result<String, StoreError>,
}

impl WriteOutcome {
    /// Both writes reached the store.
    pub fn is_complete(&self) -> bool {
        self.schedule.is_ok() && self.audit.is_ok()
    }

    fn abandoned(transition: ShiftTransition) -> Self {
        let reason = "session writer stopped before the change was written";
        Self {
            transition,
            schedule: Err(StoreError::Unavailable(reason.to_string())),
            audit: Err(StoreError::Unavailable(reason.to_string())),
        }
    }
}

/// Handle to the background writes of one click.
///
/// Dropping it leaves the writes queued.
#[derive(Debug)]
pub struct PendingWrite {
    transition: ShiftTransition,
    done: oneshot::Receiver<WriteOutcome>,
}

impl PendingWrite {
    pub fn transition(&self) -> &ShiftTransition {
        &self.transition
    }

    /// Wait for both writes to settle.
    pub async fn wait(self) -> WriteOutcome {
        match self.done.await {
            Ok(outcome) => outcome,
            Err(_) => WriteOutcome::abandoned(self.transition),
        }
    }
}

/// One queued click.
struct WriteJob {
    transition: ShiftTransition,
    record: Document,
    done: oneshot::Sender<WriteOutcome>,
}

/// Applies a session's writes one click at a time, in click order.
///
/// Runs until the session is dropped and the queue is drained.
async fn run_writer(
    store: Arc<dyn DocumentStore>,
    collections: Collections,
    doc_id: String,
    mut jobs: mpsc::UnboundedReceiver<WriteJob>,
) {
    while let Some(job) = jobs.recv().await {
        let outcome =
            write_change(store.as_ref(), &collections, &doc_id, job.transition, job.record).await;
        // The caller may have dropped its handle.
        let _ = job.done.send(outcome);
    }
    debug!(document = %doc_id, "Session writer stopped");
}

async fn write_change(
    store: &dyn DocumentStore,
    collections: &Collections,
    doc_id: &str,
    transition: ShiftTransition,
    record: Document,
) -> WriteOutcome {
    let field = (
        transition.field_path(),
        Value::String(transition.next.code().to_string()),
    );

    let schedule = store
        .update_fields(&collections.schedules, doc_id, vec![field])
        .await;
    if let Err(e) = &schedule {
        warn!(
            error = %e,
            worker = %transition.worker,
            day = transition.day,
            "Failed to persist schedule cell"
        );
    }

    let audit = store.insert_document(&collections.audit, record).await;
    match &audit {
        Ok(id) => debug!(record_id = %id, "Change recorded"),
        Err(e) => warn!(
            error = %e,
            worker = %transition.worker,
            day = transition.day,
            "Failed to record change"
        ),
    }

    WriteOutcome {
        transition,
        schedule,
        audit,
    }
}

/// One month's schedule, owned for the length of a UI session.
pub struct RosterSession {
    context: RosterContext,
    schedule: Schedule,
    writes: mpsc::UnboundedSender<WriteJob>,
}

impl RosterSession {
    fn new(context: RosterContext, schedule: Schedule) -> Self {
        let (writes, jobs) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(
            Arc::clone(&context.store),
            context.collections.clone(),
            schedule.period().document_id(),
            jobs,
        ));

        Self {
            context,
            schedule,
            writes,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn period(&self) -> Period {
        self.schedule.period()
    }

    pub fn roster(&self) -> &Roster {
        self.context.roster()
    }

    pub fn context(&self) -> &RosterContext {
        &self.context
    }

    /// Grid view of the current schedule.
    pub fn grid(&self) -> ScheduleGrid {
        ScheduleGrid::new(&self.schedule, self.context.roster())
    }

    /// Live audit history for this session's period.
    pub async fn subscribe(&self) -> Result<AuditFeed, SessionError> {
        self.context.subscribe(self.period()).await
    }

    /// Advance one cell to the next shift.
    ///
    /// The in-memory schedule changes before this returns. Persisting the
    /// cell and appending the audit record are queued on the session's
    /// writer, which applies clicks in the order they were made; the
    /// returned handle reports how they went.
    pub fn request_advance(
        &mut self,
        worker: &str,
        day: u32,
    ) -> Result<PendingWrite, SessionError> {
        let transition = advance(&mut self.schedule, worker, day)?;
        let period = self.period();
        let record = ChangeRecord::from_transition(&transition, period, Utc::now());
        let record = record.to_document()?;

        info!(
            period = %period,
            worker = %transition.worker,
            day = transition.day,
            previous = %transition.previous,
            next = %transition.next,
            "Shift advanced"
        );

        let (done, pending) = oneshot::channel();
        let job = WriteJob {
            transition: transition.clone(),
            record,
            done,
        };
        if self.writes.send(job).is_err() {
            warn!(period = %period, "Session writer is gone, change not persisted");
        }

        Ok(PendingWrite {
            transition,
            done: pending,
        })
    }
}

impl std::fmt::Debug for RosterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterSession")
            .field("period", &self.period())
            .field("days", &self.schedule.days())
            .finish_non_exhaustive()
    }
}
