//! Cross-context notification.
//!
//! Other instances sharing the same device learn about new sales through an
//! [`EventBus`]. Two transports exist: an in-process broadcast channel and a
//! bus that writes an envelope to the durable store and polls it.

mod in_process;
mod store_bus;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::error::Result;
use crate::models::Sale;

pub use in_process::InProcessBus;
pub use store_bus::StoreBus;

/// Event published after a ticket is sold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum LedgerEvent {
    #[serde(rename = "numero_vendido")]
    NumberSold(Sale),
}

/// What a subscriber observes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Another context announced a sale
    NumberSold(Sale),
    /// The stored sales list changed
    RecordsChanged(Vec<Sale>),
}

impl From<LedgerEvent> for Notification {
    fn from(event: LedgerEvent) -> Self {
        match event {
            LedgerEvent::NumberSold(sale) => Self::NumberSold(sale),
        }
    }
}

/// Transport for ledger events between contexts
pub trait EventBus: Send + Sync {
    fn publish(&self, event: &LedgerEvent) -> Result<()>;

    fn subscribe(&self) -> Subscription;
}

/// Receiving end of an [`EventBus`]
pub struct Subscription {
    inner: SubscriptionInner,
}

enum SubscriptionInner {
    Broadcast(broadcast::Receiver<Notification>),
    Channel(mpsc::Receiver<Result<Notification>>),
}

impl Subscription {
    pub(crate) const fn from_broadcast(receiver: broadcast::Receiver<Notification>) -> Self {
        Self {
            inner: SubscriptionInner::Broadcast(receiver),
        }
    }

    pub(crate) const fn from_channel(receiver: mpsc::Receiver<Result<Notification>>) -> Self {
        Self {
            inner: SubscriptionInner::Channel(receiver),
        }
    }

    /// Wait for the next notification; `None` once the bus is gone.
    ///
    /// An `Err` item is a payload that could not be parsed. It concerns that
    /// item only and the subscription stays usable.
    pub async fn recv(&mut self) -> Option<Result<Notification>> {
        match &mut self.inner {
            SubscriptionInner::Broadcast(receiver) => loop {
                match receiver.recv().await {
                    Ok(notification) => return Some(Ok(notification)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Event subscriber lagged; skipped {skipped} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            },
            SubscriptionInner::Channel(receiver) => receiver.recv().await,
        }
    }
}

/// Publishes every event on all configured transports
#[derive(Clone, Default)]
pub struct Notifier {
    buses: Vec<Arc<dyn EventBus>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.buses.push(bus);
        self
    }

    /// Best-effort publish; a failing transport is logged and skipped
    pub fn publish(&self, event: &LedgerEvent) {
        for bus in &self.buses {
            if let Err(error) = bus.publish(event) {
                tracing::warn!("Failed to publish ledger event: {error}");
            }
        }
    }

    /// One subscription per transport
    pub fn subscribe(&self) -> Vec<Subscription> {
        self.buses.iter().map(|bus| bus.subscribe()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }
}
