//! Subrange differ - incremental collection mutations.
//!
//! A collection binding streams [`SubrangeMutation`]s. Each one is applied to
//! the committed [`SubrangeState`] and translated into calls on a
//! [`LiveCollection`], the platform's list/table/stack handle.
//!
//! A binding may own only part of a larger collection: its state carries a
//! `local_offset`, and every index it reports to the platform is shifted by
//! that offset.
//!
//! # Index semantics
//!
//! Indices in a mutation refer to the state *before* the mutation:
//!
//! - `Remove { at }`: removed back to front, so earlier indices stay valid
//! - `Move { from, to }`: the items at `from` (ascending) end up contiguous,
//!   starting at `to` in the resulting state, in their original order
//! - `Update { at, elements }`: `elements[i]` replaces the item at the i-th
//!   smallest index of `at`

use std::collections::BTreeSet;
use std::ops::Range;
use std::rc::Rc;

use crate::binding::{apply_streamed, Streamed};
use crate::config::config;
use crate::engine::Storage;
use crate::error::{fail_fast, BindingError};
use crate::lifetime::Lifetime;
use crate::types::Animation;

// =============================================================================
// Index Set
// =============================================================================

/// Ordered set of indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IndexSet(BTreeSet<usize>);

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_range(range: Range<usize>) -> Self {
        Self(range.collect())
    }

    pub fn insert(&mut self, index: usize) -> bool {
        self.0.insert(index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Indices in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn first(&self) -> Option<usize> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Maximal runs of consecutive indices, ascending.
    pub fn ranges(&self) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = Vec::new();
        for index in self.iter() {
            match ranges.last_mut() {
                Some(range) if range.end == index => range.end += 1,
                _ => ranges.push(index..index + 1),
            }
        }
        ranges
    }

    /// Every index moved up by `offset`.
    pub fn shifted(&self, offset: usize) -> Self {
        Self(self.0.iter().map(|index| index + offset).collect())
    }
}

impl FromIterator<usize> for IndexSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Range<usize>> for IndexSet {
    fn from(range: Range<usize>) -> Self {
        Self::from_range(range)
    }
}

impl<const N: usize> From<[usize; N]> for IndexSet {
    fn from(indices: [usize; N]) -> Self {
        indices.into_iter().collect()
    }
}

impl From<usize> for IndexSet {
    fn from(index: usize) -> Self {
        Self(BTreeSet::from([index]))
    }
}

// =============================================================================
// Mutations
// =============================================================================

/// Structural change to a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<E> {
    /// Insert `elements` so the first lands at `at`.
    Insert { at: usize, elements: Vec<E> },
    /// Remove every index in `at`.
    Remove { at: IndexSet },
    /// Move the items at `from` to a contiguous run starting at `to`.
    Move { from: IndexSet, to: usize },
    /// Replace the items at `at` in place.
    Update { at: IndexSet, elements: Vec<E> },
    /// Replace the whole owned range.
    Reload(Vec<E>),
    /// Nothing changed structurally; refresh what is displayed.
    Scroll,
}

impl<E> Change<E> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Change::Insert { .. } => "insert",
            Change::Remove { .. } => "remove",
            Change::Move { .. } => "move",
            Change::Update { .. } => "update",
            Change::Reload(_) => "reload",
            Change::Scroll => "scroll",
        }
    }
}

/// One mutation of a collection binding.
///
/// `metadata` travels with the change and is delivered after it (section
/// headers, empty-state text). `animation` overrides the configured default.
#[derive(Debug, Clone, PartialEq)]
pub struct SubrangeMutation<E, M = ()> {
    pub change: Change<E>,
    pub metadata: Option<M>,
    pub animation: Option<Animation>,
}

impl<E, M> SubrangeMutation<E, M> {
    pub fn new(change: Change<E>) -> Self {
        Self {
            change,
            metadata: None,
            animation: None,
        }
    }

    pub fn insert(at: usize, elements: Vec<E>) -> Self {
        Self::new(Change::Insert { at, elements })
    }

    pub fn remove(at: impl Into<IndexSet>) -> Self {
        Self::new(Change::Remove { at: at.into() })
    }

    pub fn move_items(from: impl Into<IndexSet>, to: usize) -> Self {
        Self::new(Change::Move { from: from.into(), to })
    }

    pub fn update(at: impl Into<IndexSet>, elements: Vec<E>) -> Self {
        Self::new(Change::Update {
            at: at.into(),
            elements,
        })
    }

    pub fn reload(elements: Vec<E>) -> Self {
        Self::new(Change::Reload(elements))
    }

    pub fn scroll() -> Self {
        Self::new(Change::Scroll)
    }

    /// Metadata change with no structural change.
    pub fn metadata_only(metadata: M) -> Self {
        Self::update(IndexSet::new(), Vec::new()).with_metadata(metadata)
    }

    pub fn with_metadata(mut self, metadata: M) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn animated(mut self, animation: Animation) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Whether this mutation only carries metadata.
    pub fn is_metadata_only(&self) -> bool {
        self.metadata.is_some()
            && matches!(&self.change, Change::Update { at, elements } if at.is_empty() && elements.is_empty())
    }

    /// Animation to hand to the platform, after configuration defaults.
    ///
    /// Reloads are not animated unless asked for, or unless
    /// `animate_reloads` is configured.
    pub fn resolved_animation(&self) -> Animation {
        if let Some(animation) = self.animation {
            return animation;
        }
        let config = config();
        match self.change {
            Change::Reload(_) if !config.animate_reloads => Animation::None,
            _ => config.default_animation,
        }
    }
}

// =============================================================================
// State
// =============================================================================

/// Committed shape of the part of a collection one binding owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubrangeState {
    /// Position of the owned range within the whole collection.
    pub local_offset: usize,
    /// Number of items currently committed.
    pub len: usize,
}

impl SubrangeState {
    pub fn new(local_offset: usize, len: usize) -> Self {
        Self { local_offset, len }
    }

    /// Owned range in collection coordinates.
    pub fn global_range(&self) -> Range<usize> {
        self.local_offset..self.local_offset + self.len
    }

    fn global(&self, range: Range<usize>) -> Range<usize> {
        range.start + self.local_offset..range.end + self.local_offset
    }
}

// =============================================================================
// Live Collection
// =============================================================================

/// Platform collection handle receiving translated mutations.
///
/// Every index is in collection coordinates (already offset).
pub trait LiveCollection<E, M = ()> {
    /// Insert `elements` at `range` (one element per index).
    fn insert(&mut self, range: Range<usize>, elements: Vec<E>, animation: Animation);

    fn remove(&mut self, range: Range<usize>, animation: Animation);

    /// Remove the item at `from`, then insert it at `to` in the result.
    fn move_item(&mut self, from: usize, to: usize);

    fn update(&mut self, index: usize, element: E, animation: Animation);

    /// Replace the items in `range` with `elements` (lengths may differ).
    fn reload(&mut self, range: Range<usize>, elements: Vec<E>, animation: Animation);

    /// Redisplay `range` without changing it.
    fn refresh(&mut self, range: Range<usize>, animation: Animation);

    /// Deliver mutation metadata.
    fn set_metadata(&mut self, metadata: M) {
        let _ = metadata;
    }
}

impl<E, M, L: LiveCollection<E, M> + ?Sized> LiveCollection<E, M> for &mut L {
    fn insert(&mut self, range: Range<usize>, elements: Vec<E>, animation: Animation) {
        (**self).insert(range, elements, animation)
    }

    fn remove(&mut self, range: Range<usize>, animation: Animation) {
        (**self).remove(range, animation)
    }

    fn move_item(&mut self, from: usize, to: usize) {
        (**self).move_item(from, to)
    }

    fn update(&mut self, index: usize, element: E, animation: Animation) {
        (**self).update(index, element, animation)
    }

    fn reload(&mut self, range: Range<usize>, elements: Vec<E>, animation: Animation) {
        (**self).reload(range, elements, animation)
    }

    fn refresh(&mut self, range: Range<usize>, animation: Animation) {
        (**self).refresh(range, animation)
    }

    fn set_metadata(&mut self, metadata: M) {
        (**self).set_metadata(metadata)
    }
}

// =============================================================================
// Validation
// =============================================================================

pub(crate) fn check_insert(at: usize, len: usize) -> Result<(), BindingError> {
    if at > len {
        return Err(BindingError::IndexOutOfRange { index: at, len });
    }
    Ok(())
}

pub(crate) fn check_indices(indices: &IndexSet, len: usize) -> Result<(), BindingError> {
    match indices.last() {
        Some(last) if last >= len => Err(BindingError::IndexOutOfRange { index: last, len }),
        _ => Ok(()),
    }
}

pub(crate) fn check_move(from: &IndexSet, to: usize, len: usize) -> Result<(), BindingError> {
    check_indices(from, len)?;
    // The moved run must fit in the resulting state.
    match to.checked_add(from.len()) {
        Some(end) if end <= len => Ok(()),
        _ => Err(BindingError::IndexOutOfRange { index: to, len: len - from.len() }),
    }
}

pub(crate) fn check_update<E>(at: &IndexSet, elements: &[E], len: usize) -> Result<(), BindingError> {
    if at.len() != elements.len() {
        return Err(BindingError::ElementCountMismatch {
            indices: at.len(),
            elements: elements.len(),
        });
    }
    check_indices(at, len)
}

/// Check `change` against `len` committed items without touching anything.
pub(crate) fn validate_change<E>(change: &Change<E>, len: usize) -> Result<(), BindingError> {
    match change {
        Change::Insert { at, .. } => check_insert(*at, len),
        Change::Remove { at } => check_indices(at, len),
        Change::Move { from, to } => check_move(from, *to, len),
        Change::Update { at, elements } => check_update(at, elements, len),
        Change::Reload(_) | Change::Scroll => Ok(()),
    }
}

// =============================================================================
// Move Planning
// =============================================================================

/// Single-item moves that realise `Move { from, to }` on `len` items.
///
/// Each step is `(from, to)` in the coordinates of the list as it stands
/// when the step runs: remove at `from`, then insert at `to`. Steps that
/// would leave an item in place are skipped.
pub(crate) fn plan_moves(from: &IndexSet, to: usize, len: usize) -> Vec<(usize, usize)> {
    let moved: Vec<usize> = from.iter().collect();
    let mut order: Vec<usize> = (0..len).collect();
    let mut steps = Vec::new();

    for (k, &item) in moved.iter().enumerate() {
        let Some(current) = order.iter().position(|&x| x == item) else {
            continue;
        };
        order.remove(current);

        // Items still waiting to move don't count towards the target, so
        // the k-th moved item lands right after the (to + k)-th settled one.
        let pending = &moved[k + 1..];
        let target = to + k;
        let mut destination = 0;
        let mut settled = 0;
        while settled < target && destination < order.len() {
            if !pending.contains(&order[destination]) {
                settled += 1;
            }
            destination += 1;
        }

        order.insert(destination, item);
        if current != destination {
            steps.push((current, destination));
        }
    }
    steps
}

// =============================================================================
// Apply
// =============================================================================

/// Apply `mutation` to `state`, issuing the equivalent calls on `live`.
///
/// The mutation is validated against the committed state before any call
/// is issued; on error neither `state` nor `live` has been touched.
pub fn apply_mutation<E, M, L>(
    mutation: SubrangeMutation<E, M>,
    state: &mut SubrangeState,
    live: &mut L,
) -> Result<(), BindingError>
where
    L: LiveCollection<E, M> + ?Sized,
{
    let animation = mutation.resolved_animation();
    let SubrangeMutation { change, metadata, .. } = mutation;
    tracing::trace!(change = change.kind_name(), offset = state.local_offset, len = state.len, "subrange mutation");
    validate_change(&change, state.len)?;

    match change {
        Change::Insert { at, elements } => {
            if !elements.is_empty() {
                let count = elements.len();
                live.insert(state.global(at..at + count), elements, animation);
                state.len += count;
            }
        }
        Change::Remove { at } => {
            for range in at.ranges().into_iter().rev() {
                live.remove(state.global(range), animation);
            }
            state.len -= at.len();
        }
        Change::Move { from, to } => {
            for (source, destination) in plan_moves(&from, to, state.len) {
                live.move_item(source + state.local_offset, destination + state.local_offset);
            }
        }
        Change::Update { at, elements } => {
            for (index, element) in at.iter().zip(elements) {
                live.update(index + state.local_offset, element, animation);
            }
        }
        Change::Reload(elements) => {
            let old = state.global_range();
            let count = elements.len();
            if !old.is_empty() || count > 0 {
                live.reload(old, elements, animation);
            }
            state.len = count;
        }
        Change::Scroll => {
            if state.len > 0 {
                live.refresh(state.global_range(), animation);
            }
        }
    }

    if let Some(metadata) = metadata {
        live.set_metadata(metadata);
    }
    Ok(())
}

/// [`apply_mutation`] against the state cached in `storage` under `key`.
///
/// A first mutation starts from an empty state at offset 0; seed the cache
/// with [`Storage::set_cached`] to own a range further into the collection.
pub fn apply_subrange<E, M, L>(
    storage: &Storage,
    key: &'static str,
    mutation: SubrangeMutation<E, M>,
    live: &mut L,
) -> Result<(), BindingError>
where
    L: LiveCollection<E, M> + ?Sized,
{
    storage.with_cached::<SubrangeState, _>(key, |state| apply_mutation(mutation, state, live))
}

/// Bind a streamed collection: every mutation is applied as it arrives.
///
/// `live` produces the platform handle from the instance. Mutations that do
/// not fit the committed state abort.
pub fn apply_subrange_binding<I, E, M, L>(
    binding: &Streamed<SubrangeMutation<E, M>>,
    instance: &I,
    storage: &Rc<Storage>,
    key: &'static str,
    live: impl Fn(&I) -> L + 'static,
) -> Option<Lifetime>
where
    I: Clone + 'static,
    E: Clone + PartialEq + 'static,
    M: Clone + PartialEq + 'static,
    L: LiveCollection<E, M>,
{
    let storage = Rc::downgrade(storage);
    apply_streamed(binding, instance, move |instance, mutation| {
        let Some(storage) = storage.upgrade() else {
            return;
        };
        let mut handle = live(instance);
        if let Err(err) = apply_subrange(&storage, key, mutation, &mut handle) {
            fail_fast(err);
        }
    })
}
