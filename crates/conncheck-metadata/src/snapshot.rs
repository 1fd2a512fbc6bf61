//! Latest-value snapshot handles over `tokio::sync::watch`.
//!
//! A [`Publisher`] belongs to whoever refreshes the metadata. Any number of
//! [`Snapshot`] readers see the most recently published value without
//! blocking or subscribing to updates. A value may be unset (`None`).

use tokio::sync::watch;

/// Create a publisher/snapshot pair with no value set.
pub fn snapshot<T>() -> (Publisher<T>, Snapshot<T>) {
    let (tx, rx) = watch::channel(None);
    (Publisher { tx }, Snapshot { rx })
}

/// Write side of a snapshot.
#[derive(Debug)]
pub struct Publisher<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T> Publisher<T> {
    /// Replace the current value.
    pub fn publish(&self, value: T) {
        self.tx.send_replace(Some(value));
    }

    /// Mark the value as unset.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Publish `value` only if it differs from the current one.
    ///
    /// Returns whether anything changed.
    pub fn publish_if_changed(&self, value: Option<T>) -> bool
    where
        T: PartialEq,
    {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    /// New reader handle onto this publisher's value.
    pub fn subscribe(&self) -> Snapshot<T> {
        Snapshot {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of a snapshot.
///
/// Readers keep seeing the last published value even after the publisher
/// is dropped.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> Snapshot<T> {
    /// A snapshot that is permanently unset.
    pub fn unset() -> Self {
        snapshot().1
    }

    /// Clone out the most recent value.
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset() {
        let (_publisher, snap) = snapshot::<String>();
        assert_eq!(snap.latest(), None);
    }

    #[test]
    fn readers_see_latest_value() {
        let (publisher, snap) = snapshot();
        let other = publisher.subscribe();

        publisher.publish("a".to_string());
        assert_eq!(snap.latest().as_deref(), Some("a"));

        publisher.publish("b".to_string());
        assert_eq!(snap.latest().as_deref(), Some("b"));
        assert_eq!(other.latest().as_deref(), Some("b"));

        publisher.clear();
        assert_eq!(snap.latest(), None);
    }

    #[test]
    fn value_survives_dropped_publisher() {
        let (publisher, snap) = snapshot();
        publisher.publish(7u32);
        drop(publisher);
        assert_eq!(snap.latest(), Some(7));
        assert_eq!(Snapshot::<u32>::unset().latest(), None);
    }

    #[test]
    fn publish_if_changed_reports_changes() {
        let (publisher, snap) = snapshot();
        assert!(publisher.publish_if_changed(Some(1u32)));
        assert!(!publisher.publish_if_changed(Some(1)));
        assert!(publisher.publish_if_changed(None));
        assert_eq!(snap.latest(), None);
    }
}
