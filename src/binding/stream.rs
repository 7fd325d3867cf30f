//! Value streams feeding bindings.
//!
//! Two kinds of producer drive a binding after construction:
//!
//! - reactive state ([`Signal`] or a getter closure), observed with an
//!   `effect`; equal consecutive values are coalesced by the signal graph
//! - [`EventStream`], a push channel where every `send` is delivered,
//!   including repeats (mutation streams rely on this)
//!
//! [`Source`] unifies them behind one `subscribe` that returns a
//! [`Lifetime`]. Delivery is synchronous on the sending thread, and disposing
//! the lifetime stops delivery before `dispose` returns.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use spark_signals::{effect, with_context, AnyReaction, Signal};

use crate::lifetime::Lifetime;

// =============================================================================
// EventStream
// =============================================================================

type Subscriber<V> = Rc<RefCell<dyn FnMut(V)>>;

struct Subscription<V> {
    id: u64,
    active: Rc<Cell<bool>>,
    handler: Subscriber<V>,
}

struct Subscribers<V> {
    entries: Vec<Subscription<V>>,
    next_id: u64,
    delivering: bool,
    /// Values sent while a delivery is in progress.
    queued: VecDeque<V>,
}

/// Ends a delivery, dropping undelivered values if a handler panicked.
struct Delivery<'a, V>(&'a RefCell<Subscribers<V>>);

impl<V> Drop for Delivery<'_, V> {
    fn drop(&mut self) {
        let mut inner = self.0.borrow_mut();
        inner.delivering = false;
        inner.queued.clear();
    }
}

/// Push channel of values, delivered to subscribers in subscription order.
pub struct EventStream<V> {
    inner: Rc<RefCell<Subscribers<V>>>,
}

impl<V: Clone + 'static> EventStream<V> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Subscribers {
                entries: Vec::new(),
                next_id: 0,
                delivering: false,
                queued: VecDeque::new(),
            })),
        }
    }

    /// Deliver `value` to every current subscriber.
    ///
    /// Subscribers added during delivery first see the next value.
    /// Subscribers disposed during delivery are skipped. A value sent from
    /// inside a handler is queued and delivered to everyone once the current
    /// value has been, so every subscriber sees values in send order.
    pub fn send(&self, value: V) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.delivering {
                tracing::trace!(queued = inner.queued.len() + 1, "re-entrant send queued");
                inner.queued.push_back(value);
                return;
            }
            inner.delivering = true;
        }

        let _delivery = Delivery(&*self.inner);
        let mut next = Some(value);
        while let Some(value) = next {
            self.deliver(value);
            next = self.inner.borrow_mut().queued.pop_front();
        }
    }

    fn deliver(&self, value: V) {
        let snapshot: Vec<(Rc<Cell<bool>>, Subscriber<V>)> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|entry| (entry.active.clone(), entry.handler.clone()))
            .collect();

        for (active, handler) in snapshot {
            if !active.get() {
                continue;
            }
            let mut handler = handler.borrow_mut();
            (&mut *handler)(value.clone());
        }
    }

    /// Observe every subsequent value.
    pub fn subscribe(&self, handler: impl FnMut(V) + 'static) -> Lifetime {
        let active = Rc::new(Cell::new(true));
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push(Subscription {
                id,
                active: active.clone(),
                handler: Rc::new(RefCell::new(handler)),
            });
            id
        };

        let weak = Rc::downgrade(&self.inner);
        Lifetime::new(move || {
            active.set(false);
            if let Some(inner) = weak.upgrade() {
                let removed = {
                    let mut inner = inner.borrow_mut();
                    let position = inner.entries.iter().position(|entry| entry.id == id);
                    position.map(|position| inner.entries.remove(position))
                };
                drop(removed);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

impl<V: Clone + 'static> Default for EventStream<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for EventStream<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V> PartialEq for EventStream<V> {
    /// Streams compare by identity.
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<V> fmt::Debug for EventStream<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("subscribers", &self.inner.borrow().entries.len())
            .finish()
    }
}

// =============================================================================
// Detached execution
// =============================================================================

/// Run `f` as if no reaction were running.
///
/// Reads inside `f` are not tracked by the surrounding effect. Unlike
/// `untrack`, effects that `f` creates or triggers still track their own
/// reads.
pub(crate) fn detached<T>(f: impl FnOnce() -> T) -> T {
    struct Restore {
        reaction: Option<Weak<dyn AnyReaction>>,
        effect: Option<Weak<dyn AnyReaction>>,
    }

    impl Drop for Restore {
        fn drop(&mut self) {
            let (reaction, effect) = (self.reaction.take(), self.effect.take());
            with_context(|ctx| {
                ctx.set_active_reaction(reaction);
                ctx.set_active_effect(effect);
            });
        }
    }

    let _restore = with_context(|ctx| Restore {
        reaction: ctx.set_active_reaction(None),
        effect: ctx.set_active_effect(None),
    });
    f()
}

// =============================================================================
// Source
// =============================================================================

/// Anything a binding can observe after construction.
#[derive(Clone)]
pub enum Source<V: Clone + PartialEq + 'static> {
    /// Reactive signal.
    Signal(Signal<V>),
    /// Getter closure; re-read whenever the signals it reads change.
    Getter(Rc<dyn Fn() -> V>),
    /// Push channel.
    Events(EventStream<V>),
}

impl<V: Clone + PartialEq + 'static> Source<V> {
    /// Current value, for sources that have one.
    pub fn current(&self) -> Option<V> {
        match self {
            Source::Signal(signal) => Some(signal.get()),
            Source::Getter(getter) => Some(getter()),
            Source::Events(_) => None,
        }
    }

    /// Observe the source.
    ///
    /// With `skip_current`, a reactive source does not deliver the value it
    /// holds at subscription time (the caller has already applied it). Event
    /// streams never replay, so the flag does not affect them.
    ///
    /// Only the source itself is tracked. Signals read by `handler` do not
    /// re-trigger delivery.
    pub fn subscribe(&self, skip_current: bool, mut handler: impl FnMut(V) + 'static) -> Lifetime {
        match self {
            Source::Signal(signal) => {
                let signal = signal.clone();
                let mut skip = skip_current;
                let stop = effect(move || {
                    // Read first so the dependency is tracked on the skipped run.
                    let value = signal.get();
                    if skip {
                        skip = false;
                        return;
                    }
                    detached(|| handler(value));
                });
                Lifetime::new(stop)
            }
            Source::Getter(getter) => {
                let getter = getter.clone();
                let mut skip = skip_current;
                let stop = effect(move || {
                    let value = getter();
                    if skip {
                        skip = false;
                        return;
                    }
                    detached(|| handler(value));
                });
                Lifetime::new(stop)
            }
            Source::Events(events) => events.subscribe(handler),
        }
    }
}

impl<V: Clone + PartialEq + 'static> From<Signal<V>> for Source<V> {
    fn from(signal: Signal<V>) -> Self {
        Source::Signal(signal)
    }
}

impl<V: Clone + PartialEq + 'static> From<EventStream<V>> for Source<V> {
    fn from(events: EventStream<V>) -> Self {
        Source::Events(events)
    }
}

impl<V: Clone + PartialEq + 'static> fmt::Debug for Source<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Signal(_) => f.write_str("Source::Signal"),
            Source::Getter(_) => f.write_str("Source::Getter"),
            Source::Events(events) => f.debug_tuple("Source::Events").field(events).finish(),
        }
    }
}
