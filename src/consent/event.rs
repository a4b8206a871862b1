use super::record::ConsentCategories;
use crate::DEFAULT_CHANNEL_CAPACITY;
use tokio::sync::broadcast;

/// Broadcast whenever consent is applied, for other page components to react.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentEvent {
    pub categories: ConsentCategories,
}

impl ConsentEvent {
    /// DOM event name under which the page-side shim re-dispatches this event.
    pub const NAME: &'static str = "consenthub:consent-updated";
}

/// A handle for receiving consent notifications.
pub type ConsentSubscription = broadcast::Receiver<ConsentEvent>;

#[derive(Debug, Clone)]
pub(crate) struct ConsentBus {
    tx: broadcast::Sender<ConsentEvent>,
}

impl Default for ConsentBus {
    fn default() -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl ConsentBus {
    pub(crate) fn subscribe(&self) -> ConsentSubscription {
        self.tx.subscribe()
    }

    /// Returns the number of listeners the event reached.
    pub(crate) fn publish(&self, ev: ConsentEvent) -> usize {
        // send() fails only when there are 0 receivers, which is fine.
        self.tx.send(ev).unwrap_or(0)
    }
}
