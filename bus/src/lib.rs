#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Typed publish/subscribe bus decoupling simulation from presentation.
//!
//! Producers publish [`Event`] values; consumers subscribe by [`EventKind`]
//! with no compile-time reference between the two. The bus is the fault
//! isolation boundary of the simulation-to-presentation link: a listener that
//! panics is caught and logged, and never prevents sibling listeners from
//! running or propagates to the publisher.
//!
//! Dispatch iterates an immutable snapshot of the subscriber list captured
//! before any listener runs. Subscribe and unsubscribe rebuild the snapshot
//! synchronously, so a listener may mutate the registry (including removing
//! itself) while a dispatch over the previous snapshot is still in flight.
//! Single-threaded cooperative execution is assumed; there are no locks.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
};

use arcane_arena_core::{Event, EventKind};

/// Callback registered for one event kind.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Token returned by [`EventBus::subscribe`], required to unsubscribe.
///
/// Closures have no identity that could be compared on removal, so the bus
/// hands out a unique id per subscription instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Entry {
    id: SubscriptionId,
    listener: Listener,
}

struct Topic {
    listeners: Vec<Entry>,
    snapshot: Rc<[Entry]>,
}

impl Topic {
    fn empty() -> Self {
        Self {
            listeners: Vec::new(),
            snapshot: Rc::from(Vec::<Entry>::new()),
        }
    }

    fn rebuild_snapshot(&mut self) {
        self.snapshot = Rc::from(self.listeners.clone());
    }
}

struct Registry {
    topics: HashMap<EventKind, Topic>,
    next_id: u64,
}

/// Process-wide typed publish/subscribe registry.
pub struct EventBus {
    registry: RefCell<Registry>,
}

impl EventBus {
    /// Creates a bus with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(Registry {
                topics: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    /// Registers a listener for one event kind and returns its id.
    ///
    /// The kind's registry entry is created on first subscribe and the
    /// dispatch snapshot is rebuilt synchronously. Duplicate registrations of
    /// an equivalent closure are not detected; balancing subscribe with
    /// unsubscribe is the caller's responsibility.
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&Event) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        let topic = registry.topics.entry(kind).or_insert_with(Topic::empty);
        topic.listeners.push(Entry {
            id,
            listener: Rc::new(listener),
        });
        topic.rebuild_snapshot();
        id
    }

    /// Removes the subscription with the given id from one event kind.
    ///
    /// The kind's registry entry is deleted entirely once its listener list
    /// becomes empty. Unknown kinds or ids are a no-op, not an error.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) {
        let mut registry = self.registry.borrow_mut();
        let now_empty = {
            let Some(topic) = registry.topics.get_mut(&kind) else {
                return;
            };
            let Some(position) = topic.listeners.iter().position(|entry| entry.id == id) else {
                return;
            };
            let _ = topic.listeners.remove(position);
            if topic.listeners.is_empty() {
                true
            } else {
                topic.rebuild_snapshot();
                false
            }
        };
        if now_empty {
            let _ = registry.topics.remove(&kind);
        }
    }

    /// Invokes every listener registered for the event's kind, in
    /// subscription order.
    ///
    /// Returns immediately when no entry exists for the kind. Each listener
    /// invocation is isolated: a panic is caught and logged at error severity
    /// and the remaining listeners in the same pass still run. Listeners that
    /// subscribe during the pass are not invoked until the next dispatch.
    pub fn dispatch(&self, event: &Event) {
        let snapshot = {
            let registry = self.registry.borrow();
            match registry.topics.get(&event.kind()) {
                Some(topic) => Rc::clone(&topic.snapshot),
                None => return,
            }
        };

        for entry in snapshot.iter() {
            let listener = Rc::clone(&entry.listener);
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_owned());
                log::error!(
                    "listener for {:?} panicked during dispatch: {message}",
                    event.kind(),
                );
            }
        }
    }

    /// Drops every subscription.
    ///
    /// Intended for test fixtures and process teardown only; no in-flight
    /// dispatch may assume bus state survives this call.
    pub fn clear_all(&self) {
        self.registry.borrow_mut().topics.clear();
    }

    /// Number of listeners currently registered for one event kind.
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .topics
            .get(&kind)
            .map_or(0, |topic| topic.listeners.len())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("EventBus")
            .field("topics", &registry.topics.len())
            .field("next_id", &registry.next_id)
            .finish()
    }
}
