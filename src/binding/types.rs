//! Binding timing primitives.
//!
//! Each wrapper fixes *when* its payload reaches the instance. Adapters put
//! them in the cases of their binding enum; the enum implements [`Binding`]
//! so the binder can report what it is working on.

use std::fmt;
use std::rc::Rc;

use spark_signals::Signal;

use super::stream::{EventStream, Source};

// =============================================================================
// Classification
// =============================================================================

/// Timing category of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Fixed at construction.
    Constructed,
    /// Initial value plus subsequent updates.
    Valued,
    /// Updates only, after construction.
    Streamed,
    /// Values pushed out by the instance.
    Output,
    /// Delegate callback with a return value.
    Synchronous,
    /// Forwarded to the parent adapter.
    Inherited,
}

/// Implemented by each adapter's binding enum.
pub trait Binding {
    fn kind(&self) -> BindingKind;

    /// Property name, for diagnostics and storage keys.
    fn name(&self) -> &'static str;
}

/// Binding type of the root adapter; it has no cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoBinding {}

impl Binding for NoBinding {
    fn kind(&self) -> BindingKind {
        match *self {}
    }

    fn name(&self) -> &'static str {
        match *self {}
    }
}

// =============================================================================
// Constructed
// =============================================================================

/// Value supplied at construction and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Constructed<V>(pub V);

impl<V> Constructed<V> {
    pub fn value(&self) -> &V {
        &self.0
    }

    pub fn into_inner(self) -> V {
        self.0
    }
}

impl<V> From<V> for Constructed<V> {
    fn from(value: V) -> Self {
        Constructed(value)
    }
}

// =============================================================================
// Dynamic (Valued)
// =============================================================================

/// Value with an initial state and optional later updates.
///
/// The initial value is applied before any update is observed.
#[derive(Clone)]
pub enum Dynamic<V: Clone + PartialEq + 'static> {
    /// Never changes.
    Constant(V),
    /// Current signal value, then every change.
    Signal(Signal<V>),
    /// Current getter result, then every change of what it reads.
    Getter(Rc<dyn Fn() -> V>),
    /// Explicit initial value, then each value sent on the stream.
    Stream {
        initial: V,
        subsequent: EventStream<V>,
    },
}

impl<V: Clone + PartialEq + 'static> Dynamic<V> {
    /// Initial value then updates from `subsequent`.
    pub fn stream(initial: V, subsequent: EventStream<V>) -> Self {
        Dynamic::Stream { initial, subsequent }
    }

    pub fn getter(getter: impl Fn() -> V + 'static) -> Self {
        Dynamic::Getter(Rc::new(getter))
    }

    /// Value to apply before observing updates.
    pub fn initial(&self) -> V {
        match self {
            Dynamic::Constant(value) => value.clone(),
            Dynamic::Signal(signal) => signal.get(),
            Dynamic::Getter(getter) => getter(),
            Dynamic::Stream { initial, .. } => initial.clone(),
        }
    }

    /// Source of updates after the initial value, if any.
    pub fn subsequent(&self) -> Option<Source<V>> {
        match self {
            Dynamic::Constant(_) => None,
            Dynamic::Signal(signal) => Some(Source::Signal(signal.clone())),
            Dynamic::Getter(getter) => Some(Source::Getter(getter.clone())),
            Dynamic::Stream { subsequent, .. } => Some(Source::Events(subsequent.clone())),
        }
    }
}

impl<V: Clone + PartialEq + 'static> From<V> for Dynamic<V> {
    fn from(value: V) -> Self {
        Dynamic::Constant(value)
    }
}

impl<V: Clone + PartialEq + 'static> From<Signal<V>> for Dynamic<V> {
    fn from(signal: Signal<V>) -> Self {
        Dynamic::Signal(signal)
    }
}

impl<V: Clone + PartialEq + Default + 'static> Default for Dynamic<V> {
    fn default() -> Self {
        Dynamic::Constant(V::default())
    }
}

impl<V: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for Dynamic<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Dynamic::Signal(_) => f.write_str("Signal"),
            Dynamic::Getter(_) => f.write_str("Getter"),
            Dynamic::Stream { initial, .. } => f.debug_struct("Stream").field("initial", initial).finish(),
        }
    }
}

// =============================================================================
// Streamed
// =============================================================================

/// Updates only; nothing is applied at construction.
#[derive(Clone, Debug)]
pub struct Streamed<V: Clone + PartialEq + 'static>(pub Source<V>);

impl<V: Clone + PartialEq + 'static> Streamed<V> {
    pub fn source(&self) -> &Source<V> {
        &self.0
    }
}

impl<V: Clone + PartialEq + 'static> From<EventStream<V>> for Streamed<V> {
    fn from(events: EventStream<V>) -> Self {
        Streamed(Source::Events(events))
    }
}

impl<V: Clone + PartialEq + 'static> From<Signal<V>> for Streamed<V> {
    fn from(signal: Signal<V>) -> Self {
        Streamed(Source::Signal(signal))
    }
}

// =============================================================================
// Output
// =============================================================================

/// Sink receiving values the instance produces.
pub struct Output<V> {
    sink: Rc<dyn Fn(V)>,
}

impl<V: 'static> Output<V> {
    pub fn new(sink: impl Fn(V) + 'static) -> Self {
        Self { sink: Rc::new(sink) }
    }

    /// Push a value into the sink.
    pub fn send(&self, value: V) {
        (self.sink)(value)
    }

    /// Shared handle to the sink, for platform registration.
    pub fn sink(&self) -> Rc<dyn Fn(V)> {
        self.sink.clone()
    }
}

impl<V> Clone for Output<V> {
    fn clone(&self) -> Self {
        Self { sink: self.sink.clone() }
    }
}

impl<V: Clone + PartialEq + 'static> From<Signal<V>> for Output<V> {
    /// Write produced values into a signal.
    fn from(signal: Signal<V>) -> Self {
        Output::new(move |value| {
            signal.set(value);
        })
    }
}

impl<V: Clone + 'static> From<EventStream<V>> for Output<V> {
    /// Forward produced values onto a stream.
    fn from(events: EventStream<V>) -> Self {
        Output::new(move |value| events.send(value))
    }
}

impl<V> fmt::Debug for Output<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Output")
    }
}

// =============================================================================
// Synchronous
// =============================================================================

/// Handler invoked synchronously from a delegate method.
///
/// For methods whose return value the platform consumes, the handler's
/// result is returned to the caller.
pub struct Synchronous<A, R = ()> {
    handler: Rc<dyn Fn(A) -> R>,
}

impl<A: 'static, R: 'static> Synchronous<A, R> {
    pub fn new(handler: impl Fn(A) -> R + 'static) -> Self {
        Self {
            handler: Rc::new(handler),
        }
    }

    pub fn call(&self, args: A) -> R {
        (self.handler)(args)
    }

    pub fn handler(&self) -> Rc<dyn Fn(A) -> R> {
        self.handler.clone()
    }
}

impl<A, R> Clone for Synchronous<A, R> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl<A, R> fmt::Debug for Synchronous<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Synchronous")
    }
}
