//! Durable-store transport.
//!
//! Publishing writes a timestamped envelope under the broadcast key.
//! Subscribers poll that key and the sales key, and report each change.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::{EventBus, LedgerEvent, Notification, Subscription};
use crate::db::{keys, KeyValueStore};
use crate::error::{Error, Result};
use crate::models::Sale;

const CHANNEL_CAPACITY: usize = 64;

const NUMBER_SOLD: &str = "numero_vendido";

/// Stored form of a published event
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    payload: Sale,
    /// Unix milliseconds; makes repeated identical events distinct
    timestamp: i64,
}

impl Envelope {
    fn wrap(event: &LedgerEvent, timestamp: i64) -> Self {
        match event {
            LedgerEvent::NumberSold(sale) => Self {
                kind: NUMBER_SOLD.to_string(),
                payload: sale.clone(),
                timestamp,
            },
        }
    }
}

/// Event bus over a shared durable store
pub struct StoreBus<S> {
    store: Arc<S>,
    poll_interval: Duration,
}

impl<S: KeyValueStore + 'static> StoreBus<S> {
    pub const fn new(store: Arc<S>, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
        }
    }
}

impl<S: KeyValueStore + 'static> EventBus for StoreBus<S> {
    fn publish(&self, event: &LedgerEvent) -> Result<()> {
        let envelope = Envelope::wrap(event, chrono::Utc::now().timestamp_millis());
        self.store
            .set(keys::BROADCAST, &serde_json::to_string(&envelope)?)
    }

    /// Start polling; must be called from within a tokio runtime
    fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let store = self.store.clone();
        let poll_interval = self.poll_interval;
        // Baseline now, so writes made before the first poll still count as changes.
        let mut watcher = KeyWatcher::new(store.as_ref());

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if sender.is_closed() {
                    break;
                }
                for item in watcher.poll(store.as_ref()) {
                    if sender.send(item).await.is_err() {
                        return;
                    }
                }
            }
        });

        Subscription::from_channel(receiver)
    }
}

/// Remembers the last seen raw values of the watched keys
struct KeyWatcher {
    envelope: Option<String>,
    sales: Option<String>,
}

impl KeyWatcher {
    /// Start from the current values so old changes are not replayed
    fn new(store: &impl KeyValueStore) -> Self {
        Self {
            envelope: store.get(keys::BROADCAST).ok().flatten(),
            sales: store.get(keys::SALES).ok().flatten(),
        }
    }

    fn poll(&mut self, store: &impl KeyValueStore) -> Vec<Result<Notification>> {
        let mut items = Vec::new();

        match changed(store, keys::BROADCAST, &mut self.envelope) {
            Ok(Some(raw)) => items.push(parse_envelope(&raw)),
            Ok(None) => {}
            Err(error) => tracing::warn!("Failed to read broadcast key: {error}"),
        }

        match changed(store, keys::SALES, &mut self.sales) {
            Ok(Some(raw)) => items.push(parse_sales(&raw)),
            Ok(None) => {}
            Err(error) => tracing::warn!("Failed to read sales key: {error}"),
        }

        items
    }
}

fn changed(
    store: &impl KeyValueStore,
    key: &str,
    last: &mut Option<String>,
) -> Result<Option<String>> {
    let current = store.get(key)?;
    if current == *last {
        return Ok(None);
    }
    last.clone_from(&current);
    Ok(current)
}

fn parse_envelope(raw: &str) -> Result<Notification> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    if envelope.kind != NUMBER_SOLD {
        return Err(Error::InvalidInput(format!(
            "unknown broadcast type '{}'",
            envelope.kind
        )));
    }
    Ok(Notification::NumberSold(envelope.payload))
}

fn parse_sales(raw: &str) -> Result<Notification> {
    let sales: Vec<Sale> = serde_json::from_str(raw)?;
    Ok(Notification::RecordsChanged(sales))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{BuyerInfo, SaleStatus};
    use pretty_assertions::assert_eq;

    fn sale(number: u32) -> Sale {
        Sale::new("3A", number, BuyerInfo::default(), SaleStatus::Reserved)
    }

    #[test]
    fn publish_writes_timestamped_envelope() {
        let store = Arc::new(MemoryStore::new());
        let bus = StoreBus::new(store.clone(), Duration::from_millis(10));

        bus.publish(&LedgerEvent::NumberSold(sale(7))).unwrap();

        let raw = store.get(keys::BROADCAST).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["type"], "numero_vendido");
        assert_eq!(value["payload"]["numero"], 7);
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn watcher_reports_only_changes() {
        let store = MemoryStore::new();
        store.set(keys::SALES, "[]").unwrap();
        let mut watcher = KeyWatcher::new(&store);
        assert!(watcher.poll(&store).is_empty());

        let listed = vec![sale(1)];
        store
            .set(keys::SALES, &serde_json::to_string(&listed).unwrap())
            .unwrap();

        let items = watcher.poll(&store);
        assert_eq!(items.len(), 1);
        assert_eq!(
            items.into_iter().next().unwrap().unwrap(),
            Notification::RecordsChanged(listed)
        );
        assert!(watcher.poll(&store).is_empty());
    }

    #[test]
    fn watcher_surfaces_unparsable_payload_as_error() {
        let store = MemoryStore::new();
        let mut watcher = KeyWatcher::new(&store);

        store.set(keys::BROADCAST, "not json").unwrap();
        let items = watcher.poll(&store);
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(Error::Serialization(_))));

        // The next change is still delivered.
        let sold = sale(3);
        let envelope = Envelope::wrap(&LedgerEvent::NumberSold(sold.clone()), 1);
        store
            .set(keys::BROADCAST, &serde_json::to_string(&envelope).unwrap())
            .unwrap();
        let items = watcher.poll(&store);
        assert_eq!(
            items.into_iter().next().unwrap().unwrap(),
            Notification::NumberSold(sold)
        );
    }

    #[test]
    fn unknown_envelope_type_is_rejected() {
        let raw = serde_json::json!({
            "type": "numero_apagado",
            "payload": sale(1),
            "timestamp": 5
        })
        .to_string();
        assert!(matches!(parse_envelope(&raw), Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn subscriber_in_another_context_receives_published_event() {
        let store = Arc::new(MemoryStore::new());
        let publisher = StoreBus::new(store.clone(), Duration::from_millis(10));
        let listener = StoreBus::new(store, Duration::from_millis(10));
        let mut subscription = listener.subscribe();

        let sold = sale(9);
        publisher
            .publish(&LedgerEvent::NumberSold(sold.clone()))
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), subscription.recv())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(received, Notification::NumberSold(sold));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn write_before_first_poll_is_still_reported() {
        let store = Arc::new(MemoryStore::new());
        let bus = StoreBus::new(store.clone(), Duration::from_millis(10));
        let mut subscription = bus.subscribe();

        // The poller task has not run yet on this single-threaded runtime.
        let listed = vec![sale(4)];
        store
            .set(keys::SALES, &serde_json::to_string(&listed).unwrap())
            .unwrap();

        let received = tokio::time::timeout(Duration::from_millis(500), subscription.recv())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(received, Notification::RecordsChanged(listed));
    }
}
