use crate::core::models::change::{Change, Topic};
use crate::core::ports::notifier::Notifier;
use tokio::sync::broadcast::{self, error::RecvError};

/// In-process change feed shared by every request handler.
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    sender: broadcast::Sender<Change>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Changes published from now on that match `topic`. Dropping the subscription unsubscribes.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            topic,
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Notifier for BroadcastHub {
    fn publish(&self, change: Change) {
        // no subscribers is not an error
        if self.sender.send(change).is_err() {
            log::trace!("change published without subscribers");
        }
    }
}

#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<Change>,
    topic: Topic,
}

impl Subscription {
    /// Waits for the next matching change. `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<Change> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.topic.matches(&change) => return Some(change),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("live subscriber lagged behind, {} changes skipped", missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
