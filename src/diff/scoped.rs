//! Scoped value differ.
//!
//! Some properties are set per scope (a control state, a metrics class) with
//! one setter call per key. A scoped binding carries a whole snapshot of
//! `(scope, value)` pairs; applying a snapshot must remove keys that
//! disappeared since the previous one and set every key still present.
//!
//! Duplicate keys within a snapshot resolve to one application per key, at
//! the position of the first occurrence, carrying the last value.

use std::collections::HashSet;
use std::hash::Hash;
use std::rc::Rc;

use crate::binding::{apply_dynamic, Dynamic};
use crate::engine::Storage;
use crate::lifetime::Lifetime;
use crate::types::{BarMetrics, ControlScope, ControlState};

// =============================================================================
// Scoped Values
// =============================================================================

/// Snapshot of values keyed by scope, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedValues<S, V> {
    pairs: Vec<(S, V)>,
}

impl<S, V> Default for ScopedValues<S, V> {
    fn default() -> Self {
        Self { pairs: Vec::new() }
    }
}

impl<S: Eq + Hash, V> ScopedValues<S, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: Vec<(S, V)>) -> Self {
        Self { pairs }
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, scope: S, value: V) -> Self {
        self.push(scope, value);
        self
    }

    pub fn push(&mut self, scope: S, value: V) {
        self.pairs.push((scope, value));
    }

    /// Pairs as declared, duplicates included.
    pub fn pairs(&self) -> &[(S, V)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Effective value for `scope` (the last one declared).
    pub fn value(&self, scope: &S) -> Option<&V> {
        self.pairs.iter().rev().find(|(s, _)| s == scope).map(|(_, v)| v)
    }

    /// Distinct scopes, in first-occurrence order.
    pub fn scopes(&self) -> Vec<&S> {
        let mut seen = HashSet::new();
        self.pairs
            .iter()
            .filter(|(scope, _)| seen.insert(scope))
            .map(|(scope, _)| scope)
            .collect()
    }

    /// One `(scope, effective value)` per distinct scope.
    pub fn resolved(&self) -> Vec<(&S, &V)> {
        self.scopes()
            .into_iter()
            .filter_map(|scope| self.value(scope).map(|value| (scope, value)))
            .collect()
    }
}

impl<S: Eq + Hash, V> FromIterator<(S, V)> for ScopedValues<S, V> {
    fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

// -----------------------------------------------------------------------------
// Control scopes
// -----------------------------------------------------------------------------

impl<V> ScopedValues<ControlScope, V> {
    /// Single value for the normal state.
    pub fn normal(value: V) -> Self {
        Self::for_state(ControlState::NORMAL, value)
    }

    pub fn highlighted(value: V) -> Self {
        Self::for_state(ControlState::HIGHLIGHTED, value)
    }

    pub fn disabled(value: V) -> Self {
        Self::for_state(ControlState::DISABLED, value)
    }

    pub fn selected(value: V) -> Self {
        Self::for_state(ControlState::SELECTED, value)
    }

    pub fn for_state(state: ControlState, value: V) -> Self {
        Self {
            pairs: vec![(ControlScope::from(state), value)],
        }
    }

    pub fn with_metrics(state: ControlState, metrics: BarMetrics, value: V) -> Self {
        Self {
            pairs: vec![(ControlScope::new(state, metrics), value)],
        }
    }

    /// Add a value for `state` under default metrics.
    pub fn and_state(mut self, state: ControlState, value: V) -> Self {
        self.pairs.push((ControlScope::from(state), value));
        self
    }

    /// Value for `scope`, falling back to the normal state under the same
    /// metrics, then to the normal state under default metrics.
    pub fn value_or_normal(&self, scope: ControlScope) -> Option<&V> {
        self.value(&scope)
            .or_else(|| self.value(&ControlScope::new(ControlState::NORMAL, scope.metrics)))
            .or_else(|| self.value(&ControlScope::NORMAL))
    }
}

// =============================================================================
// Diff
// =============================================================================

/// Reconcile `next` against `previous`.
///
/// Calls `remove_one` for every scope in `previous` absent from `next`, then
/// `apply_one` once per distinct scope in `next`. With no previous snapshot
/// nothing is removed; an empty `next` removes everything.
pub fn diff_scoped<S, V>(
    previous: Option<&ScopedValues<S, V>>,
    next: &ScopedValues<S, V>,
    mut remove_one: impl FnMut(&S),
    mut apply_one: impl FnMut(&S, &V),
) where
    S: Eq + Hash,
{
    let resolved = next.resolved();
    if let Some(previous) = previous {
        let kept: HashSet<&S> = resolved.iter().map(|(scope, _)| *scope).collect();
        for scope in previous.scopes() {
            if !kept.contains(scope) {
                remove_one(scope);
            }
        }
    }
    for (scope, value) in resolved {
        apply_one(scope, value);
    }
}

/// [`diff_scoped`] against the snapshot last applied under `key`.
///
/// The new snapshot replaces the cached one once applied.
pub fn apply_scoped<S, V>(
    storage: &Storage,
    key: &'static str,
    next: ScopedValues<S, V>,
    remove_one: impl FnMut(&S),
    apply_one: impl FnMut(&S, &V),
) where
    S: Eq + Hash + 'static,
    V: 'static,
{
    let previous = storage.take_cached::<ScopedValues<S, V>>(key);
    diff_scoped(previous.as_ref(), &next, remove_one, apply_one);
    tracing::trace!(id = %storage.id(), key, scopes = next.len(), "scoped values applied");
    storage.set_cached(key, next);
}

/// Bind a valued scoped property: the initial snapshot and each update are
/// diffed against the one before.
pub fn apply_scoped_binding<I, S, V>(
    binding: &Dynamic<ScopedValues<S, V>>,
    instance: &I,
    storage: &Rc<Storage>,
    key: &'static str,
    remove_one: impl Fn(&I, &S) + 'static,
    apply_one: impl Fn(&I, &S, &V) + 'static,
) -> Option<Lifetime>
where
    I: Clone + 'static,
    S: Clone + Eq + Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    let storage = Rc::downgrade(storage);
    apply_dynamic(binding, instance, move |instance, next| {
        let Some(storage) = storage.upgrade() else {
            return;
        };
        apply_scoped(
            &storage,
            key,
            next,
            |scope| remove_one(instance, scope),
            |scope, value| apply_one(instance, scope, value),
        );
    })
}
