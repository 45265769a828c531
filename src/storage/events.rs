//! Typed publish/subscribe for store changes.
//!
//! Subscribers register a callback for one [`Topic`]. Emitting an event calls
//! every subscriber of that topic in registration order. A subscriber that
//! returns an error or panics is logged and skipped; delivery to the rest
//! continues and the emitter never sees the failure.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{trace, warn};

use super::ViewMode;

/// Change categories a subscriber can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Topic {
    Tasks,
    Filters,
    ViewMode,
    UnsavedChanges,
    UserConfig,
}

impl Topic {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Filters => "filters",
            Self::ViewMode => "viewMode",
            Self::UnsavedChanges => "unsavedChanges",
            Self::UserConfig => "userConfig",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "topic", rename_all = "camelCase")]
pub enum StoreEvent {
    /// The ticket collection changed.
    Tasks { count: usize },
    /// Filter state changed.
    Filters,
    ViewMode { mode: ViewMode },
    /// The unsaved flag flipped.
    UnsavedChanges { unsaved: bool },
    /// Tags, rules or blacklist changed.
    UserConfig,
}

impl StoreEvent {
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::Tasks { .. } => Topic::Tasks,
            Self::Filters => Topic::Filters,
            Self::ViewMode { .. } => Topic::ViewMode,
            Self::UnsavedChanges { .. } => Topic::UnsavedChanges,
            Self::UserConfig => Topic::UserConfig,
        }
    }
}

/// Handle returned by `subscribe`, unique across all buses in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Subscriber callback. Errors are reported, never propagated.
pub type Callback = Box<dyn FnMut(&StoreEvent) -> anyhow::Result<()>>;

struct Subscriber {
    id: SubscriptionId,
    topic: Topic,
    callback: Callback,
}

/// Ordered list of subscribers keyed by topic.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Outcome of one emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, topic: Topic, callback: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) -> anyhow::Result<()> + 'static,
    {
        let id = SubscriptionId::next();
        self.subscribers.push(Subscriber {
            id,
            topic,
            callback: Box::new(callback),
        });
        trace!(%id, %topic, "Subscriber registered");
        id
    }

    /// Remove a subscriber. Returns false if the id is unknown here.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers.iter().filter(|s| s.topic == topic).count()
    }

    /// Deliver `event` to every subscriber of its topic, in order.
    pub fn emit(&mut self, event: &StoreEvent) -> Delivery {
        let topic = event.topic();
        let mut delivery = Delivery::default();

        for subscriber in self.subscribers.iter_mut().filter(|s| s.topic == topic) {
            let callback = &mut subscriber.callback;
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => delivery.delivered += 1,
                Ok(Err(err)) => {
                    delivery.failed += 1;
                    warn!(
                        subscriber = %subscriber.id,
                        %topic,
                        error = %err,
                        "Subscriber failed; continuing delivery"
                    );
                }
                Err(panic) => {
                    delivery.failed += 1;
                    warn!(
                        subscriber = %subscriber.id,
                        %topic,
                        panic = panic_message(panic.as_ref()),
                        "Subscriber panicked; continuing delivery"
                    );
                }
            }
        }

        delivery
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn delivers_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for n in 0..3 {
            let log = Rc::clone(&log);
            bus.subscribe(Topic::Tasks, move |_| {
                log.borrow_mut().push(n);
                Ok(())
            });
        }

        let delivery = bus.emit(&StoreEvent::Tasks { count: 0 });
        assert_eq!(delivery.delivered, 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn only_matching_topic_is_notified() {
        let hits = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let h = Rc::clone(&hits);
        bus.subscribe(Topic::Filters, move |_| {
            *h.borrow_mut() += 1;
            Ok(())
        });

        bus.emit(&StoreEvent::Tasks { count: 1 });
        assert_eq!(*hits.borrow(), 0);
        bus.emit(&StoreEvent::Filters);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn failures_are_isolated() {
        let reached = Rc::new(RefCell::new(false));
        let mut bus = EventBus::new();
        bus.subscribe(Topic::Tasks, |_| anyhow::bail!("boom"));
        bus.subscribe(Topic::Tasks, |_| panic!("subscriber panic"));
        let r = Rc::clone(&reached);
        bus.subscribe(Topic::Tasks, move |_| {
            *r.borrow_mut() = true;
            Ok(())
        });

        let delivery = bus.emit(&StoreEvent::Tasks { count: 0 });
        assert_eq!(delivery, Delivery { delivered: 1, failed: 2 });
        assert!(*reached.borrow());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let id = bus.subscribe(Topic::UserConfig, |_| Ok(()));
        assert_eq!(bus.subscriber_count(Topic::UserConfig), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.emit(&StoreEvent::UserConfig).delivered, 0);
    }

    #[test]
    fn event_topics() {
        assert_eq!(StoreEvent::UnsavedChanges { unsaved: true }.topic(), Topic::UnsavedChanges);
        assert_eq!(Topic::ViewMode.to_string(), "viewMode");
    }
}
