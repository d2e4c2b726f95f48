use crate::core::models::change::Change;

/// Fan-out of committed row changes to live subscribers.
pub trait Notifier {
    fn publish(&self, change: Change);

    fn publish_all(&self, changes: impl IntoIterator<Item = Change>) {
        for change in changes {
            self.publish(change);
        }
    }
}
