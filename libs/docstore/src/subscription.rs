//! Live query subscriptions.
//!
//! A subscription is a spawned forwarding task plus the receiving half of
//! a channel. The task sends a full snapshot when it starts, then again
//! whenever the backend announces a change to the subscribed collection.
//! Dropping or cancelling the subscription aborts the task, which releases
//! its change listener.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_core::Stream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::{Query, StoreError, StoredDocument};

/// Snapshots buffered before the forwarding task waits on the consumer.
const SNAPSHOT_BUFFER: usize = 16;

/// One result of a live query: the full ordered result set.
pub type Snapshot = Result<Vec<StoredDocument>, StoreError>;

/// A live, cancellable stream of query snapshots.
pub struct Subscription {
    query: Query,
    snapshots: ReceiverStream<Snapshot>,
    task: JoinHandle<()>,
    cancelled: bool,
}

impl Subscription {
    /// Start forwarding snapshots of `query`.
    ///
    /// `changes` carries the names of collections that changed. With
    /// `poll` set, the snapshot is also re-read on that interval and sent
    /// when it differs from the previous one.
    pub(crate) fn spawn<F>(
        query: Query,
        mut changes: broadcast::Receiver<String>,
        poll: Option<Duration>,
        snapshot: F,
    ) -> Self
    where
        F: Fn(&Query) -> Snapshot + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let task_query = query.clone();

        let task = tokio::spawn(async move {
            let query = task_query;
            let mut last: Option<Result<Vec<StoredDocument>, String>> = None;
            let mut ticker = poll.filter(|d| !d.is_zero()).map(tokio::time::interval);

            loop {
                let current = snapshot(&query);
                // Errors compare by message so a failing poll reports once.
                let seen = match &current {
                    Ok(docs) => Ok(docs.clone()),
                    Err(e) => Err(e.to_string()),
                };

                if last.as_ref() != Some(&seen) {
                    last = Some(seen);
                    if tx.send(current).await.is_err() {
                        debug!(collection = %query.collection, "Subscriber gone, stopping");
                        return;
                    }
                }

                // Wait for the next relevant change or poll tick.
                loop {
                    let tick = async {
                        match ticker.as_mut() {
                            Some(t) => {
                                t.tick().await;
                            }
                            None => std::future::pending::<()>().await,
                        }
                    };

                    tokio::select! {
                        msg = changes.recv() => match msg {
                            Ok(collection) if collection == query.collection => break,
                            Ok(_) => continue,
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!(
                                    collection = %query.collection,
                                    skipped,
                                    "Change notifications lagged, resending snapshot"
                                );
                                break;
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                debug!(collection = %query.collection, "Store closed, ending subscription");
                                return;
                            }
                        },
                        _ = tick => break,
                    }
                }
            }
        });

        Self {
            query,
            snapshots: ReceiverStream::new(rx),
            task,
            cancelled: false,
        }
    }

    /// The query this subscription follows.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Wait for the next snapshot. `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if self.cancelled {
            return None;
        }
        StreamExt::next(&mut self.snapshots).await
    }

    /// Whether the forwarding task is still running.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the subscription and wait until its listener is released.
    ///
    /// Snapshots still buffered are discarded.
    pub async fn cancel(&mut self) {
        self.cancelled = true;
        self.task.abort();
        let _ = (&mut self.task).await;
        self.snapshots.close();
        debug!(collection = %self.query.collection, "Subscription cancelled");
    }
}

impl Stream for Subscription {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancelled {
            return Poll::Ready(None);
        }
        Pin::new(&mut self.snapshots).poll_next(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("query", &self.query)
            .field("active", &self.is_active())
            .finish()
    }
}
