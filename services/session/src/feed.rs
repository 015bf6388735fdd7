//! Live audit history for one period.

use roster_core::{ChangeRecord, Period};
use roster_docstore::Subscription;
use tracing::warn;

use crate::SessionError;

/// A cancellable stream of audit snapshots, newest first.
///
/// Each item is the full history for the feed's period. Records tagged with
/// another period are dropped; untagged records are kept. Records that do
/// not decode are skipped.
#[derive(Debug)]
pub struct AuditFeed {
    period: Period,
    subscription: Subscription,
}

impl AuditFeed {
    pub(crate) fn new(period: Period, subscription: Subscription) -> Self {
        Self {
            period,
            subscription,
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Next snapshot, or `None` once the feed is cancelled.
    pub async fn next(&mut self) -> Option<Result<Vec<ChangeRecord>, SessionError>> {
        let snapshot = self.subscription.next().await?;
        Some(
            snapshot
                .map(|docs| {
                    docs.iter()
                        .filter_map(|doc| match ChangeRecord::from_document(&doc.data) {
                            Ok(record) => Some(record),
                            Err(e) => {
                                warn!(record_id = %doc.id, error = %e, "Skipping malformed change record");
                                None
                            }
                        })
                        .filter(|record| record.belongs_to(self.period))
                        .collect()
                })
                .map_err(SessionError::from),
        )
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop listening. Further calls to [`next`](Self::next) return `None`.
    pub async fn cancel(&mut self) {
        self.subscription.cancel().await;
    }
}
