//! In-process broadcast transport

use tokio::sync::broadcast;

use super::{EventBus, LedgerEvent, Notification, Subscription};
use crate::error::Result;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast channel shared by contexts living in the same process
#[derive(Clone)]
pub struct InProcessBus {
    sender: broadcast::Sender<Notification>,
}

impl InProcessBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl Default for InProcessBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InProcessBus {
    fn publish(&self, event: &LedgerEvent) -> Result<()> {
        // No live subscriber is not an error.
        let _ = self.sender.send(Notification::from(event.clone()));
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        Subscription::from_broadcast(self.sender.subscribe())
    }
}
