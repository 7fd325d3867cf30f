//! Dynamic delegate multiplexer.
//!
//! Handlers are registered per method in one of two modes:
//! - single: exactly one handler, its return value goes back to the platform
//! - multi: any number of handlers, fanned out in registration order
//!
//! Every registration returns a [`Lifetime`] that removes exactly that
//! handler. Once a method has no handlers left, the multiplexer stops
//! responding to it.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::engine::Storage;
use crate::error::{or_fail, BindingError};
use crate::lifetime::Lifetime;
use crate::types::InstanceId;

// =============================================================================
// Types
// =============================================================================

/// Identifier of one method of a delegate protocol.
///
/// Implemented by a fieldless enum per protocol:
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum TextFieldMethod { ShouldBeginEditing, ShouldReturn, DidEndEditing }
///
/// impl DelegateMethod for TextFieldMethod {
///     fn returns_value(self) -> bool {
///         !matches!(self, TextFieldMethod::DidEndEditing)
///     }
/// }
/// ```
pub trait DelegateMethod: Copy + Eq + Hash + fmt::Debug + 'static {
    /// Protocol name for diagnostics.
    fn protocol() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Whether the platform consumes the method's return value.
    ///
    /// Such methods accept a single handler only.
    fn returns_value(self) -> bool;
}

/// Where a protocol's delegate is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegatePhase {
    NoDelegateNeeded,
    ClassSelected,
    Installed,
}

/// Registration mode of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerMode {
    Single,
    Multi,
}

/// Type-erased view of a multiplexer, for storage bookkeeping.
pub trait AnyDelegate {
    fn protocol(&self) -> &'static str;
    fn phase(&self) -> DelegatePhase;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

struct HandlerSlot {
    mode: HandlerMode,
    // (registration id, Rc<dyn Fn(A) -> R> boxed as Any)
    entries: Vec<(u64, Rc<dyn Any>)>,
}

// =============================================================================
// Multiplexer
// =============================================================================

/// Stand-in delegate for protocol `M`.
pub struct Multiplexer<M: DelegateMethod> {
    owner: InstanceId,
    handlers: RefCell<HashMap<M, HandlerSlot>>,
    next_id: Cell<u64>,
    phase: Cell<DelegatePhase>,
}

impl<M: DelegateMethod> Multiplexer<M> {
    /// New multiplexer for `owner`, in the `ClassSelected` phase.
    pub fn new(owner: InstanceId) -> Rc<Self> {
        Rc::new(Self {
            owner,
            handlers: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            phase: Cell::new(DelegatePhase::ClassSelected),
        })
    }

    pub fn owner(&self) -> InstanceId {
        self.owner
    }

    pub fn protocol(&self) -> &'static str {
        M::protocol()
    }

    pub fn phase(&self) -> DelegatePhase {
        self.phase.get()
    }

    pub(crate) fn mark_installed(&self) {
        self.phase.set(DelegatePhase::Installed);
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register the one handler for `method`.
    ///
    /// A second single registration for the same method is a misuse error,
    /// never a silent overwrite.
    pub fn add_single<A: 'static, R: 'static>(
        self: &Rc<Self>,
        method: M,
        handler: impl Fn(A) -> R + 'static,
    ) -> Result<Lifetime, BindingError> {
        {
            let handlers = self.handlers.borrow();
            if let Some(slot) = handlers.get(&method) {
                return Err(match slot.mode {
                    HandlerMode::Single => BindingError::DuplicateSingleHandler {
                        method: format!("{method:?}"),
                        id: self.owner,
                    },
                    HandlerMode::Multi => BindingError::HandlerModeConflict {
                        method: format!("{method:?}"),
                    },
                });
            }
        }
        let handler: Rc<dyn Fn(A) -> R> = Rc::new(handler);
        Ok(self.insert(method, HandlerMode::Single, Rc::new(handler)))
    }

    /// Add a notification handler for `method`, after any existing ones.
    pub fn add_multi<A: 'static>(
        self: &Rc<Self>,
        method: M,
        handler: impl Fn(A) + 'static,
    ) -> Result<Lifetime, BindingError> {
        if method.returns_value() {
            return Err(BindingError::NotifyForValueMethod {
                method: format!("{method:?}"),
            });
        }
        if let Some(slot) = self.handlers.borrow().get(&method) {
            if slot.mode == HandlerMode::Single {
                return Err(BindingError::HandlerModeConflict {
                    method: format!("{method:?}"),
                });
            }
        }
        let handler: Rc<dyn Fn(A)> = Rc::new(handler);
        Ok(self.insert(method, HandlerMode::Multi, Rc::new(handler)))
    }

    fn insert(self: &Rc<Self>, method: M, mode: HandlerMode, handler: Rc<dyn Any>) -> Lifetime {
        let registration = self.next_id.get();
        self.next_id.set(registration + 1);

        self.handlers
            .borrow_mut()
            .entry(method)
            .or_insert_with(|| HandlerSlot { mode, entries: Vec::new() })
            .entries
            .push((registration, handler));
        tracing::trace!(owner = %self.owner, ?method, ?mode, "delegate handler registered");

        let weak: Weak<Self> = Rc::downgrade(self);
        Lifetime::new(move || {
            if let Some(multiplexer) = weak.upgrade() {
                multiplexer.remove(method, registration);
            }
        })
    }

    fn remove(&self, method: M, registration: u64) {
        let removed = {
            let mut handlers = self.handlers.borrow_mut();
            let Some(slot) = handlers.get_mut(&method) else {
                return;
            };
            let removed = slot
                .entries
                .iter()
                .position(|(id, _)| *id == registration)
                .map(|position| slot.entries.remove(position));
            if slot.entries.is_empty() {
                handlers.remove(&method);
            }
            removed
        };
        // Handler closures may own lifetimes; drop outside the borrow.
        drop(removed);
        tracing::trace!(owner = %self.owner, ?method, "delegate handler removed");
    }

    // -------------------------------------------------------------------------
    // Presence
    // -------------------------------------------------------------------------

    /// Whether the platform should treat `method` as implemented.
    pub fn responds_to(&self, method: M) -> bool {
        self.handlers
            .borrow()
            .get(&method)
            .is_some_and(|slot| !slot.entries.is_empty())
    }

    /// Methods with at least one handler, for `Debug`.
    fn registered_methods(&self) -> Vec<M> {
        self.handlers.borrow().keys().copied().collect()
    }

    pub fn handler_count(&self, method: M) -> usize {
        self.handlers
            .borrow()
            .get(&method)
            .map_or(0, |slot| slot.entries.len())
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Invoke the single handler for `method` and return its result.
    pub fn try_invoke<A: 'static, R: 'static>(&self, method: M, args: A) -> Result<R, BindingError> {
        let handler = {
            let handlers = self.handlers.borrow();
            let slot = handlers
                .get(&method)
                .filter(|slot| slot.mode == HandlerMode::Single)
                .and_then(|slot| slot.entries.first());
            match slot {
                Some((_, handler)) => handler.clone(),
                None => {
                    return Err(BindingError::UnhandledMethod {
                        method: format!("{method:?}"),
                    });
                }
            }
        };
        // Borrow released: the handler may register or remove handlers.
        let handler = handler
            .downcast_ref::<Rc<dyn Fn(A) -> R>>()
            .cloned()
            .ok_or_else(|| BindingError::HandlerSignatureMismatch {
                method: format!("{method:?}"),
            })?;
        Ok(handler(args))
    }

    /// Invoke the single handler for `method`.
    ///
    /// The platform only calls methods the multiplexer responds to, so a
    /// missing handler is an invariant violation and aborts.
    #[track_caller]
    pub fn invoke<A: 'static, R: 'static>(&self, method: M, args: A) -> R {
        or_fail(self.try_invoke(method, args))
    }

    /// Deliver a notification to every handler of `method`, in registration
    /// order. Methods without handlers are ignored.
    ///
    /// A handler removed by an earlier handler of the same notification is
    /// not called.
    #[track_caller]
    pub fn notify<A: Clone + 'static>(&self, method: M, args: A) {
        let snapshot: Vec<(u64, Rc<dyn Any>)> = self
            .handlers
            .borrow()
            .get(&method)
            .map(|slot| slot.entries.clone())
            .unwrap_or_default();

        for (registration, handler) in snapshot {
            if !self.is_registered(method, registration) {
                continue;
            }
            let Some(handler) = handler.downcast_ref::<Rc<dyn Fn(A)>>().cloned() else {
                crate::error::fail_fast(BindingError::HandlerSignatureMismatch {
                    method: format!("{method:?}"),
                });
            };
            handler(args.clone());
        }
    }

    fn is_registered(&self, method: M, registration: u64) -> bool {
        self.handlers
            .borrow()
            .get(&method)
            .is_some_and(|slot| slot.entries.iter().any(|(id, _)| *id == registration))
    }
}

impl<M: DelegateMethod> AnyDelegate for Multiplexer<M> {
    fn protocol(&self) -> &'static str {
        M::protocol()
    }

    fn phase(&self) -> DelegatePhase {
        self.phase.get()
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl<M: DelegateMethod> fmt::Debug for Multiplexer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multiplexer")
            .field("protocol", &M::protocol())
            .field("owner", &self.owner)
            .field("phase", &self.phase.get())
            .field("methods", &self.registered_methods())
            .finish()
    }
}

/// Phase of protocol `M`'s delegate on an instance.
pub fn delegate_phase<M: DelegateMethod>(storage: &Storage) -> DelegatePhase {
    storage
        .delegate::<M>()
        .map_or(DelegatePhase::NoDelegateNeeded, |multiplexer| multiplexer.phase())
}
