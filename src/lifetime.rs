//! Lifetimes - cancellable handles for live bindings.
//!
//! A [`Lifetime`] represents exactly one live effect (a subscription, a
//! registered delegate handler, an attached producer). Disposing it undoes
//! that effect. Disposal is synchronous: once `dispose()` returns, no further
//! callbacks from the effect arrive.
//!
//! [`AggregateLifetime`] folds any number of optional lifetimes into one.
//! `None` members mean "nothing to cancel" and are filtered out; an aggregate
//! with no remaining members is itself `None`.
//!
//! # Invariants
//!
//! 1. Disposing twice is a no-op.
//! 2. Dropping a lifetime disposes it.
//! 3. Aggregates dispose members in the order they were added, each exactly
//!    once, even if a member's disposal re-enters the aggregate.

use std::cell::RefCell;
use std::fmt;

/// Teardown closure, run at most once.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Lifetime
// =============================================================================

/// Disposable handle for one live effect.
#[must_use = "dropping a Lifetime disposes it immediately"]
pub struct Lifetime {
    cleanup: RefCell<Option<Cleanup>>,
}

impl Lifetime {
    /// Wrap a teardown closure.
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: RefCell::new(Some(Box::new(cleanup))),
        }
    }

    /// Undo the effect. Subsequent calls do nothing.
    pub fn dispose(&self) {
        // Take before running so re-entrant calls see an empty slot.
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    /// Whether the effect has been torn down.
    pub fn is_disposed(&self) -> bool {
        self.cleanup.borrow().is_none()
    }
}

impl Drop for Lifetime {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl From<Cleanup> for Lifetime {
    fn from(cleanup: Cleanup) -> Self {
        Self {
            cleanup: RefCell::new(Some(cleanup)),
        }
    }
}

impl fmt::Debug for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifetime")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// =============================================================================
// Aggregate
// =============================================================================

/// Ordered collection of lifetimes that becomes one lifetime.
#[derive(Default, Debug)]
pub struct AggregateLifetime {
    members: Vec<Lifetime>,
}

impl AggregateLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. `None` is ignored.
    pub fn push(&mut self, lifetime: Option<Lifetime>) {
        if let Some(lifetime) = lifetime {
            self.members.push(lifetime);
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Collapse into a single lifetime, or `None` if nothing needs cleanup.
    pub fn into_lifetime(mut self) -> Option<Lifetime> {
        match self.members.len() {
            0 => None,
            1 => self.members.pop(),
            _ => {
                let members = std::mem::take(&mut self.members);
                Some(Lifetime::new(move || {
                    for member in &members {
                        member.dispose();
                    }
                }))
            }
        }
    }
}

impl Extend<Option<Lifetime>> for AggregateLifetime {
    fn extend<T: IntoIterator<Item = Option<Lifetime>>>(&mut self, iter: T) {
        for lifetime in iter {
            self.push(lifetime);
        }
    }
}

impl FromIterator<Option<Lifetime>> for AggregateLifetime {
    fn from_iter<T: IntoIterator<Item = Option<Lifetime>>>(iter: T) -> Self {
        let mut aggregate = AggregateLifetime::new();
        aggregate.extend(iter);
        aggregate
    }
}

/// Combine optional lifetimes into one.
///
/// Returns `None` when every input is `None` ("no cleanup needed").
pub fn aggregate(lifetimes: impl IntoIterator<Item = Option<Lifetime>>) -> Option<Lifetime> {
    lifetimes
        .into_iter()
        .collect::<AggregateLifetime>()
        .into_lifetime()
}
