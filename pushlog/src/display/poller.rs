//! Timed polling loop that prints records not seen on the previous tick.

use std::collections::HashSet;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::report::render_report;
use crate::record::StoredRecord;
use crate::storage::RecordStore;

/// Polls the store and renders the delta against the previous tick.
///
/// The seen set lives only in this process, so a restart renders everything
/// currently in the store once.
pub struct DisplayPoller {
    store: Arc<dyn RecordStore>,
    limit: Option<usize>,
    seen: HashSet<String>,
}

impl DisplayPoller {
    pub fn new(store: Arc<dyn RecordStore>, limit: Option<usize>) -> Self {
        Self {
            store,
            limit,
            seen: HashSet::new(),
        }
    }

    /// Run one poll-compare-render cycle.
    ///
    /// Returns the report when the fetched set contains records missing from
    /// the previous tick, `None` otherwise. A failed read leaves the seen set
    /// untouched so the next successful tick still reports the delta.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Option<String> {
        let fetched = match self.store.query_recent(self.limit).await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "display_poll_failed");
                return None;
            }
        };

        let total = fetched.len();
        let mut fresh: Vec<StoredRecord> = fetched
            .iter()
            .rev()
            .filter(|r| !self.seen.contains(&r.id))
            .cloned()
            .collect();

        self.seen = fetched.into_iter().map(|r| r.id).collect();

        if fresh.is_empty() {
            debug!(total = total, "display_no_new_records");
            return None;
        }

        fresh.sort_by(|a, b| a.record.timestamp.cmp(&b.record.timestamp));
        info!(new_records = fresh.len(), total = total, "display_new_records");

        Some(render_report(&fresh, total, now))
    }

    /// Tick every `interval` until `shutdown` resolves.
    ///
    /// Ticks run one at a time; a slow read delays the next tick instead of
    /// overlapping it. A tick that has started always finishes.
    pub async fn run<W, S>(mut self, interval: Duration, mut out: W, shutdown: S)
    where
        W: Write,
        S: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        info!(interval_secs = interval.as_secs(), limit = ?self.limit, "display_polling_started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("display_stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Some(report) = self.tick(Utc::now()).await {
                        if let Err(e) = writeln!(out, "{}", report).and_then(|_| out.flush()) {
                            error!(error = %e, "display_write_failed");
                        }
                    }
                }
            }
        }

        info!("display_stopped");
    }
}
