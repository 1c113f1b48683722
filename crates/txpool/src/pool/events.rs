//! Subscription fan-out: `subscribe` registers a channel; dispatch happens
//! inline on whichever task publishes an event, using `try_send` so a slow
//! subscriber never blocks ingress or the housekeeper. Built on
//! `tokio::sync::mpsc`.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

use crate::tx_object::TxObject;

/// Delivered to subscribers on every ingress acceptance and on every
/// executable-status broadcast during a wash.
#[derive(Debug, Clone)]
pub struct TxEvent {
    pub tx: Arc<TxObject>,
    pub executable: bool,
}

/// Per-subscriber mailbox depth. A full channel drops the event rather than
/// blocking the publisher: delivery is at-most-once, best-effort.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 1024;

/// Registry of active subscribers. Dispatch happens on whatever task calls
/// [`Subscribers::broadcast`] (the housekeeper, or ingress itself); slow
/// subscribers are handled with `try_send`, never `.await`.
#[derive(Debug, Default)]
pub struct Subscribers {
    channels: Mutex<Vec<mpsc::Sender<TxEvent>>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new receiver and returns it.
    pub fn subscribe(&self) -> mpsc::Receiver<TxEvent> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        self.channels.lock().push(tx);
        rx
    }

    /// Dispatches one event to every live subscriber, dropping it for any
    /// subscriber whose buffer is full and pruning subscribers whose
    /// receiver has been dropped.
    pub fn broadcast(&self, event: TxEvent) {
        let mut channels = self.channels.lock();
        channels.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!(target: "txpool::events", "subscriber buffer full, dropping event");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// Drops every registered sender, so each subscriber's receiver observes
    /// channel closure (`recv()` returns `None`) — used by `Pool::close`.
    pub fn close_all(&self) {
        self.channels.lock().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.channels.lock().len()
    }
}
