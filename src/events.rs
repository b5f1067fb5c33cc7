use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Multi-subscriber signal backed by unbounded channels.
///
/// `emit` is safe to call from synchronous code (including notify's
/// callback thread when a sender is handed over); receivers are drained on
/// the thread that owns the engine, so subscribers never observe
/// cross-thread mutation.
#[derive(Debug, Default)]
pub struct Signal<T: Clone> {
    subscribers: Vec<UnboundedSender<T>>,
}

impl<T: Clone> Signal<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a new subscriber. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Send `value` to every live subscriber, pruning closed ones.
    pub fn emit(&mut self, value: T) {
        self.subscribers.retain(|tx| tx.send(value.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
