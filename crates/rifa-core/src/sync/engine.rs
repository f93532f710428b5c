//! Best-effort propagation of unsynced sales.
//!
//! A push is attempted once per trigger. Failures only log: the sale keeps
//! `synced = false` and is picked up again by the next sweep. The ledger lock
//! is released while the request is in flight.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{RemoteSink, RemoteSource};
use crate::db::KeyValueStore;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::SaleId;

/// Ledger shared between the caller, sync tasks and listeners
pub type SharedLedger<S> = Arc<Mutex<Ledger<S>>>;

/// Outcome of one push attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Synced,
    /// Remote rejected it or was unreachable; retried on the next sweep
    Failed,
    /// Already synced, removed meanwhile, or sync disabled
    Skipped,
}

/// Totals for one sweep over unsynced sales
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
}

/// Push a single sale if it still needs it
pub async fn push_sale<S, R>(ledger: &SharedLedger<S>, remote: &R, id: &SaleId) -> Result<PushOutcome>
where
    S: KeyValueStore,
    R: RemoteSink,
{
    if !remote.is_enabled() {
        tracing::debug!("Remote endpoint not configured; sale {id} stays local");
        return Ok(PushOutcome::Skipped);
    }

    let snapshot = {
        let ledger = ledger.lock().await;
        match ledger.get(id) {
            Some(sale) if !sale.synced => sale.clone(),
            _ => return Ok(PushOutcome::Skipped),
        }
    };

    match remote.push(&snapshot).await {
        Ok(()) => {
            let mut ledger = ledger.lock().await;
            // A sale edited while the request was in flight needs another push.
            if ledger.get(id) != Some(&snapshot) {
                tracing::debug!("Sale {id} changed during push; leaving it unsynced");
                return Ok(PushOutcome::Skipped);
            }
            if ledger.mark_synced(id)? {
                ledger.record_sync_time(chrono::Utc::now())?;
                tracing::info!("Synced sale {id}");
                Ok(PushOutcome::Synced)
            } else {
                Ok(PushOutcome::Skipped)
            }
        }
        Err(error) => {
            tracing::warn!("Failed to sync sale {id}: {error}");
            Ok(PushOutcome::Failed)
        }
    }
}

/// Attempt every sale still marked unsynced
pub async fn sync_pending<S, R>(ledger: &SharedLedger<S>, remote: &R) -> Result<SyncReport>
where
    S: KeyValueStore,
    R: RemoteSink,
{
    let mut report = SyncReport::default();
    if !remote.is_enabled() {
        tracing::debug!("Remote endpoint not configured; skipping sync sweep");
        return Ok(report);
    }

    let pending = ledger.lock().await.unsynced_ids();
    for id in pending {
        match push_sale(ledger, remote, &id).await? {
            PushOutcome::Synced => {
                report.attempted += 1;
                report.synced += 1;
            }
            PushOutcome::Failed => {
                report.attempted += 1;
                report.failed += 1;
            }
            PushOutcome::Skipped => {}
        }
    }

    if report.attempted > 0 {
        tracing::info!(
            "Sync sweep finished: {} synced, {} failed",
            report.synced,
            report.failed
        );
    }
    Ok(report)
}

/// Fetch the remote dataset and merge it; returns how many rows were read
pub async fn load_remote<S, R>(ledger: &SharedLedger<S>, source: &R) -> Result<Option<usize>>
where
    S: KeyValueStore,
    R: RemoteSource,
{
    if !source.is_enabled() {
        tracing::debug!("Remote sheet not configured; skipping initial load");
        return Ok(None);
    }

    let remote = source.fetch_all().await?;
    let count = remote.len();
    ledger.lock().await.merge_from_remote(remote)?;
    Ok(Some(count))
}

/// Sweep unsynced sales every `interval` until `shutdown` turns true
pub fn spawn_sync_loop<S, R>(
    ledger: SharedLedger<S>,
    remote: Arc<R>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: KeyValueStore + 'static,
    R: RemoteSink,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; mutations already trigger their own push.
        ticker.tick().await;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    // Pick up edits other processes made to the shared store.
                    if let Err(error) = ledger.lock().await.reload() {
                        tracing::warn!("Failed to reload sales before sweep: {error}");
                    }
                    if let Err(error) = sync_pending(&ledger, remote.as_ref()).await {
                        tracing::warn!("Sync sweep failed: {error}");
                    }
                }
            }
        }
        tracing::debug!("Sync loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RaffleRules;
    use crate::db::MemoryStore;
    use crate::error::Error;
    use crate::models::{BuyerInfo, Sale, SaleStatus};
    use pretty_assertions::assert_eq;
    use std::future::Future;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Sink whose availability can be toggled
    #[derive(Default)]
    struct FlakySink {
        up: AtomicBool,
        calls: AtomicUsize,
    }

    impl FlakySink {
        fn up() -> Self {
            let sink = Self::default();
            sink.up.store(true, Ordering::SeqCst);
            sink
        }
    }

    impl RemoteSink for FlakySink {
        fn push(&self, _sale: &Sale) -> impl Future<Output = Result<()>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let up = self.up.load(Ordering::SeqCst);
            async move {
                if up {
                    Ok(())
                } else {
                    Err(Error::Remote("endpoint returned HTTP 503".to_string()))
                }
            }
        }
    }

    struct DisabledSink;

    impl RemoteSink for DisabledSink {
        fn is_enabled(&self) -> bool {
            false
        }

        fn push(&self, _sale: &Sale) -> impl Future<Output = Result<()>> + Send {
            async { Err(Error::Remote("disabled sink was called".to_string())) }
        }
    }

    struct FixedSource(Vec<Sale>);

    impl RemoteSource for FixedSource {
        fn fetch_all(&self) -> impl Future<Output = Result<Vec<Sale>>> + Send {
            let sales = self.0.clone();
            async move { Ok(sales) }
        }
    }

    fn shared() -> SharedLedger<MemoryStore> {
        let ledger = Ledger::open(Arc::new(MemoryStore::new()), RaffleRules::default()).unwrap();
        Arc::new(Mutex::new(ledger))
    }

    async fn reserve(ledger: &SharedLedger<MemoryStore>, number: u32) -> Sale {
        ledger
            .lock()
            .await
            .reserve("3A", number, BuyerInfo::default())
            .unwrap()
    }

    #[tokio::test]
    async fn successful_push_marks_synced_and_records_time() {
        let ledger = shared();
        let sale = reserve(&ledger, 7).await;
        let sink = FlakySink::up();

        let outcome = push_sale(&ledger, &sink, &sale.id).await.unwrap();
        assert_eq!(outcome, PushOutcome::Synced);

        let guard = ledger.lock().await;
        assert!(guard.get(&sale.id).unwrap().synced);
        assert!(guard.last_sync().unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_push_keeps_sale_unsynced_until_next_sweep() {
        let ledger = shared();
        let sale = reserve(&ledger, 7).await;
        let sink = FlakySink::default();

        let outcome = push_sale(&ledger, &sink, &sale.id).await.unwrap();
        assert_eq!(outcome, PushOutcome::Failed);
        assert!(!ledger.lock().await.get(&sale.id).unwrap().synced);
        assert_eq!(ledger.lock().await.last_sync().unwrap(), None);

        sink.up.store(true, Ordering::SeqCst);
        let report = sync_pending(&ledger, &sink).await.unwrap();
        assert_eq!(
            report,
            SyncReport {
                attempted: 1,
                synced: 1,
                failed: 0,
            }
        );
        assert!(ledger.lock().await.get(&sale.id).unwrap().synced);
    }

    #[tokio::test]
    async fn sweep_skips_synced_sales() {
        let ledger = shared();
        reserve(&ledger, 1).await;
        reserve(&ledger, 2).await;
        let sink = FlakySink::up();

        sync_pending(&ledger, &sink).await.unwrap();
        let report = sync_pending(&ledger, &sink).await.unwrap();

        assert_eq!(report, SyncReport::default());
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_sink_is_a_silent_no_op() {
        let ledger = shared();
        let sale = reserve(&ledger, 7).await;

        assert_eq!(
            push_sale(&ledger, &DisabledSink, &sale.id).await.unwrap(),
            PushOutcome::Skipped
        );
        assert_eq!(
            sync_pending(&ledger, &DisabledSink).await.unwrap(),
            SyncReport::default()
        );
        assert!(!ledger.lock().await.get(&sale.id).unwrap().synced);
    }

    #[tokio::test]
    async fn push_of_removed_sale_is_skipped() {
        let ledger = shared();
        let sale = reserve(&ledger, 7).await;
        ledger.lock().await.remove(&sale.id).unwrap();

        let sink = FlakySink::up();
        assert_eq!(
            push_sale(&ledger, &sink, &sale.id).await.unwrap(),
            PushOutcome::Skipped
        );
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn load_remote_merges_snapshot() {
        let ledger = shared();
        reserve(&ledger, 7).await;
        let remote = Sale::new("3B", 1, BuyerInfo::default(), SaleStatus::Paid);

        let count = load_remote(&ledger, &FixedSource(vec![remote.clone()]))
            .await
            .unwrap();
        assert_eq!(count, Some(1));

        let guard = ledger.lock().await;
        assert_eq!(guard.sales().len(), 2);
        assert!(guard.get(&remote.id).unwrap().from_remote);
    }

    #[tokio::test]
    async fn sync_loop_retries_until_shutdown() {
        let ledger = shared();
        let sale = reserve(&ledger, 7).await;
        let sink = Arc::new(FlakySink::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = spawn_sync_loop(
            ledger.clone(),
            sink.clone(),
            Duration::from_millis(20),
            shutdown_rx,
        );

        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(sink.calls.load(Ordering::SeqCst) >= 1);
        assert!(!ledger.lock().await.get(&sale.id).unwrap().synced);

        sink.up.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(ledger.lock().await.get(&sale.id).unwrap().synced);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn sync_loop_keeps_edits_made_by_another_process() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(Mutex::new(
            Ledger::open(store.clone(), RaffleRules::default()).unwrap(),
        ));
        let sale = reserve(&ledger, 7).await;

        let mut other = Ledger::open(store.clone(), RaffleRules::default()).unwrap();
        other.update_status(&sale.id, SaleStatus::Cancelled).unwrap();

        let sink = Arc::new(FlakySink::up());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_sync_loop(
            ledger.clone(),
            sink.clone(),
            Duration::from_millis(20),
            shutdown_rx,
        );
        tokio::time::sleep(Duration::from_millis(70)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        let stored = Ledger::open(store, RaffleRules::default()).unwrap();
        let stored_sale = stored.get(&sale.id).unwrap();
        assert_eq!(stored_sale.status, SaleStatus::Cancelled);
        assert!(stored_sale.synced);
        assert!(!ledger.lock().await.is_sold("3A", 7));
    }
}
