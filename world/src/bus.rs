//! Typed publish/subscribe channel with immediate and deferred delivery.
//!
//! Listeners receive a mutable context alongside the event. The bus lives
//! inside that context (as the [`World`](crate::World) owns its bus), so
//! delivery goes through [`dispatch`] and [`flush`], which temporarily move the
//! listener list out of the bus so listeners may freely mutate the context,
//! including the bus itself.
//!
//! Subscription changes made during an emission follow fixed rules:
//!
//! * a listener subscribed mid-emission first hears the next emission;
//! * a listener unsubscribed mid-emission is not called for the remainder of
//!   the emission in progress;
//! * an event emitted while listeners of the same kind are mid-delivery is
//!   queued for the next flush instead of being delivered recursively.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use sanctum_core::{Event, EventKind};
use tracing::{trace, warn};

/// Event type routable on an [`EventBus`].
pub trait BusEvent {
    /// Payload-free discriminant used as the subscription key.
    type Kind: Copy + Ord + fmt::Debug;

    /// Discriminant of this event.
    fn kind(&self) -> Self::Kind;
}

impl BusEvent for Event {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        Event::kind(self)
    }
}

/// Callback invoked for every event of the kind it subscribed to.
pub type Listener<C, E> = Box<dyn FnMut(&mut C, &E)>;

/// Handle identifying a subscription, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Subscription<C, E> {
    id: ListenerId,
    listener: Listener<C, E>,
}

enum Delivery<C, E> {
    Idle,
    Reentrant,
    Batch(Vec<Subscription<C, E>>),
}

/// Publish/subscribe channel delivering events of type `E` with context `C`.
pub struct EventBus<C, E: BusEvent> {
    listeners: BTreeMap<E::Kind, Vec<Subscription<C, E>>>,
    delivering: BTreeMap<E::Kind, BTreeSet<ListenerId>>,
    cancelled: BTreeSet<ListenerId>,
    deferred: Vec<E>,
    next_listener: u64,
}

impl<C, E: BusEvent> EventBus<C, E> {
    /// Creates a bus without listeners or queued events.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: BTreeMap::new(),
            delivering: BTreeMap::new(),
            cancelled: BTreeSet::new(),
            deferred: Vec::new(),
            next_listener: 0,
        }
    }

    /// Registers `listener` for every future event of `kind`.
    ///
    /// Listeners of one kind are called in subscription order.
    pub fn subscribe<F>(&mut self, kind: E::Kind, listener: F) -> ListenerId
    where
        F: FnMut(&mut C, &E) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.entry(kind).or_default().push(Subscription {
            id,
            listener: Box::new(listener),
        });
        id
    }

    /// Removes a subscription. Returns `false` when the handle is unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        for subscriptions in self.listeners.values_mut() {
            if let Some(index) = subscriptions.iter().position(|entry| entry.id == id) {
                let _ = subscriptions.remove(index);
                return true;
            }
        }

        let in_flight = self.delivering.values().any(|ids| ids.contains(&id));
        in_flight && self.cancelled.insert(id)
    }

    /// Number of listeners currently subscribed to `kind`, including any
    /// that are mid-delivery.
    #[must_use]
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        let resting = self.listeners.get(&kind).map_or(0, Vec::len);
        let in_flight = self.delivering.get(&kind).map_or(0, |ids| {
            ids.iter().filter(|id| !self.cancelled.contains(id)).count()
        });
        resting + in_flight
    }

    /// Queues `event` for the next flush without delivering it.
    pub fn defer(&mut self, event: E) {
        self.deferred.push(event);
    }

    /// Number of events waiting for the next flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    fn begin(&mut self, kind: E::Kind) -> Delivery<C, E> {
        if self.delivering.contains_key(&kind) {
            return Delivery::Reentrant;
        }

        match self.listeners.remove(&kind) {
            Some(batch) if !batch.is_empty() => {
                let ids = batch.iter().map(|entry| entry.id).collect();
                let _ = self.delivering.insert(kind, ids);
                Delivery::Batch(batch)
            }
            _ => Delivery::Idle,
        }
    }

    fn is_cancelled(&self, id: ListenerId) -> bool {
        self.cancelled.contains(&id)
    }

    fn finish(&mut self, kind: E::Kind, mut batch: Vec<Subscription<C, E>>) {
        let _ = self.delivering.remove(&kind);
        batch.retain(|entry| !self.cancelled.remove(&entry.id));
        if let Some(added) = self.listeners.remove(&kind) {
            batch.extend(added);
        }
        if !batch.is_empty() {
            let _ = self.listeners.insert(kind, batch);
        }
    }
}

impl<C, E: BusEvent> Default for EventBus<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E: BusEvent> fmt::Debug for EventBus<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<E::Kind, usize> = self
            .listeners
            .iter()
            .map(|(kind, entries)| (*kind, entries.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("listeners", &counts)
            .field("delivering", &self.delivering.keys().collect::<Vec<_>>())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}

/// Delivers `event` through the bus owned by `ctx`.
///
/// `bus` projects the context onto its bus. Listeners receive the whole
/// context and may subscribe, unsubscribe, emit or defer while running.
pub fn dispatch<C, E: BusEvent>(ctx: &mut C, bus: fn(&mut C) -> &mut EventBus<C, E>, event: E) {
    let kind = event.kind();
    let mut batch = match bus(ctx).begin(kind) {
        Delivery::Idle => return,
        Delivery::Reentrant => {
            warn!(?kind, "Re-entrant emission deferred to the next flush");
            bus(ctx).defer(event);
            return;
        }
        Delivery::Batch(batch) => batch,
    };

    trace!(?kind, listeners = batch.len(), "Dispatching event");
    for subscription in batch.iter_mut() {
        if bus(ctx).is_cancelled(subscription.id) {
            continue;
        }
        (subscription.listener)(ctx, &event);
    }

    bus(ctx).finish(kind, batch);
}

/// Delivers every event queued on the bus owned by `ctx` before this call.
///
/// Events deferred while the flush runs stay queued for the following flush.
pub fn flush<C, E: BusEvent>(ctx: &mut C, bus: fn(&mut C) -> &mut EventBus<C, E>) {
    let batch = std::mem::take(&mut bus(ctx).deferred);
    for event in batch {
        dispatch(ctx, bus, event);
    }
}
