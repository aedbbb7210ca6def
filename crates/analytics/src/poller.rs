// In crates/analytics/src/poller.rs

use chrono::NaiveDate;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use storage::ReportStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::AggregationService;
use crate::types::TotalsSnapshot;

/// Re-reads the totals for a date on a fixed interval and hands each
/// snapshot to a callback. This is plain polling, not a subscription: saves
/// are picked up on the next tick.
///
/// The poller runs until [`TotalsPoller::stop`] is called or the handle is
/// dropped. Must be started from inside a tokio runtime.
pub struct TotalsPoller {
    handle: JoinHandle<()>,
}

impl TotalsPoller {
    pub fn spawn<F>(
        store: Arc<Mutex<ReportStore>>,
        date: NaiveDate,
        interval: Duration,
        mut on_update: F,
    ) -> Self
    where
        F: FnMut(TotalsSnapshot) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let snapshot = {
                    let store = store.lock().unwrap_or_else(PoisonError::into_inner);
                    AggregationService::new(&store).snapshot(date)
                };
                tracing::trace!(%date, pnl = snapshot.totals.pnl, "Polled totals.");
                on_update(snapshot);
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops polling. No callback runs after this returns to the runtime.
    pub fn stop(self) {
        // Dropping aborts the task.
    }
}

impl Drop for TotalsPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
