//! Shared raffle service used by every front end.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};

use crate::db::KeyValueStore;
use crate::events::{LedgerEvent, Notifier, Subscription};
use crate::ledger::Ledger;
use crate::models::{BuyerInfo, DuplicateTicket, ManualSale, Sale, SaleId, SaleStats, SaleStatus};
use crate::sync::{self, RemoteSink, RemoteSource, SharedLedger, SyncReport};
use crate::Result;

/// Ledger plus its remote and notification plumbing.
///
/// Cloning is cheap; clones share the same ledger and in-flight push set.
pub struct RaffleService<S, R> {
    ledger: SharedLedger<S>,
    remote: Arc<R>,
    notifier: Notifier,
    in_flight: Arc<StdMutex<JoinSet<()>>>,
}

impl<S, R> Clone for RaffleService<S, R> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            remote: self.remote.clone(),
            notifier: self.notifier.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<S, R> RaffleService<S, R>
where
    S: KeyValueStore + 'static,
    R: RemoteSink + RemoteSource,
{
    pub fn new(ledger: Ledger<S>, remote: Arc<R>, notifier: Notifier) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            remote,
            notifier,
            in_flight: Arc::new(StdMutex::new(JoinSet::new())),
        }
    }

    pub const fn ledger(&self) -> &SharedLedger<S> {
        &self.ledger
    }

    pub fn remote(&self) -> &R {
        self.remote.as_ref()
    }

    /// Reserve a ticket, announce it and start pushing it
    pub async fn reserve(&self, group: &str, number: u32, buyer: BuyerInfo) -> Result<Sale> {
        let sale = self.ledger.lock().await.reserve(group, number, buyer)?;
        self.after_sale(&sale);
        Ok(sale)
    }

    pub async fn add_manual(&self, data: ManualSale) -> Result<Sale> {
        let sale = self.ledger.lock().await.add_manual(data)?;
        self.after_sale(&sale);
        Ok(sale)
    }

    pub async fn update_status(&self, id: &SaleId, status: SaleStatus) -> Result<Sale> {
        let sale = self.ledger.lock().await.update_status(id, status)?;
        self.schedule_push(sale.id.clone());
        Ok(sale)
    }

    /// Delete locally; the remote is not told
    pub async fn remove(&self, id: &SaleId) -> Result<bool> {
        self.ledger.lock().await.remove(id)
    }

    pub async fn sales(&self) -> Vec<Sale> {
        self.ledger.lock().await.sales().to_vec()
    }

    pub async fn sales_in_group(&self, group: &str) -> Vec<Sale> {
        self.ledger
            .lock()
            .await
            .sales_in_group(group)
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: &SaleId) -> Option<Sale> {
        self.ledger.lock().await.get(id).cloned()
    }

    pub async fn groups(&self) -> Vec<String> {
        self.ledger.lock().await.groups()
    }

    pub async fn is_sold(&self, group: &str, number: u32) -> bool {
        self.ledger.lock().await.is_sold(group, number)
    }

    pub async fn available_numbers(&self, group: &str) -> Vec<u32> {
        self.ledger.lock().await.available_numbers(group)
    }

    pub async fn stats(&self) -> SaleStats {
        self.ledger.lock().await.stats()
    }

    pub async fn duplicates(&self) -> Vec<DuplicateTicket> {
        self.ledger.lock().await.duplicates()
    }

    pub async fn last_sync(&self) -> Result<Option<DateTime<Utc>>> {
        self.ledger.lock().await.last_sync()
    }

    /// Push every unsynced sale now
    pub async fn sync_pending(&self) -> Result<SyncReport> {
        sync::sync_pending(&self.ledger, self.remote.as_ref()).await
    }

    /// Fetch and merge the remote dataset; `None` when no sheet is configured
    pub async fn load_remote(&self) -> Result<Option<usize>> {
        sync::load_remote(&self.ledger, self.remote.as_ref()).await
    }

    /// Startup variant of [`Self::load_remote`]: a failed fetch keeps local data
    pub async fn initial_load(&self) -> Option<usize> {
        match self.load_remote().await {
            Ok(count) => count,
            Err(error) => {
                tracing::warn!("Initial remote load failed; continuing with local data: {error}");
                None
            }
        }
    }

    /// Wait for every push started by a mutation so far
    pub async fn wait_for_sync(&self) {
        let mut pending = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *in_flight)
        };
        while let Some(joined) = pending.join_next().await {
            if let Err(error) = joined {
                tracing::warn!("Sync task ended abnormally: {error}");
            }
        }
    }

    pub fn spawn_sync_loop(
        &self,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        sync::spawn_sync_loop(self.ledger.clone(), self.remote.clone(), interval, shutdown)
    }

    /// One subscription per configured transport
    pub fn subscribe(&self) -> Vec<Subscription> {
        self.notifier.subscribe()
    }

    /// Apply notifications from `subscription` until it closes or `shutdown`
    /// turns true. Bad payloads are logged and skipped.
    pub fn spawn_listener(
        &self,
        mut subscription: Subscription,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let ledger = self.ledger.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    item = subscription.recv() => {
                        let Some(item) = item else {
                            break;
                        };
                        let applied = match item {
                            Ok(notification) => ledger.lock().await.apply(notification),
                            Err(error) => Err(error),
                        };
                        match applied {
                            Ok(0) => {}
                            Ok(added) => tracing::info!("Applied {added} sales from another context"),
                            Err(error) => tracing::warn!("Ignoring ledger notification: {error}"),
                        }
                    }
                }
            }
            tracing::debug!("Ledger listener stopped");
        })
    }

    fn after_sale(&self, sale: &Sale) {
        self.notifier
            .publish(&LedgerEvent::NumberSold(sale.clone()));
        self.schedule_push(sale.id.clone());
    }

    fn schedule_push(&self, id: SaleId) {
        if !RemoteSink::is_enabled(self.remote.as_ref()) {
            tracing::debug!("Remote endpoint not configured; sale {id} stays local");
            return;
        }

        let ledger = self.ledger.clone();
        let remote = self.remote.clone();
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.spawn(async move {
            if let Err(error) = sync::push_sale(&ledger, remote.as_ref(), &id).await {
                tracing::warn!("Failed to persist sync state for {id}: {error}");
            }
        });
    }
}
