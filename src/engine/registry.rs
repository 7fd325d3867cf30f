//! Instance Registry - identity allocation for bound instances.
//!
//! Manages the lifecycle of instance identities:
//! - Slot allocation with a free pool for O(1) reuse
//! - Per-slot generations, so ids of released instances stay dead
//! - Human-readable labels (`"TextField#3"`) for diagnostics
//! - ReactiveSet of live slots (deriveds react to construction/destruction)
//! - Destroy hooks, run exactly once when the instance is released
//! - [`Registration`], the guard an instance owns to release itself on drop

use std::cell::RefCell;
use std::collections::HashMap;
use spark_signals::ReactiveSet;

use super::storage;
use crate::error::BindingError;
use crate::lifetime::Cleanup;
use crate::types::InstanceId;

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Map instance index to its label.
    static INDEX_TO_LABEL: RefCell<HashMap<usize, String>> = RefCell::new(HashMap::new());

    /// Set of currently live indices.
    /// Using ReactiveSet so deriveds that iterate over live instances
    /// automatically react when instances are constructed or released.
    static ALLOCATED_INDICES: RefCell<ReactiveSet<usize>> = RefCell::new(ReactiveSet::new());

    /// Current generation of every slot ever allocated.
    static GENERATIONS: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };

    /// Next index to allocate if pool is empty.
    static NEXT_INDEX: RefCell<usize> = const { RefCell::new(0) };

    /// Counter for generating labels.
    static LABEL_COUNTER: RefCell<usize> = const { RefCell::new(0) };

    /// Destroy callbacks registered per live index.
    static DESTROY_CALLBACKS: RefCell<HashMap<usize, Vec<Cleanup>>> = RefCell::new(HashMap::new());
}

/// False during thread teardown, once any registry table is gone.
fn tables_reachable() -> bool {
    INDEX_TO_LABEL.try_with(|_| ()).is_ok()
        && ALLOCATED_INDICES.try_with(|_| ()).is_ok()
        && GENERATIONS.try_with(|_| ()).is_ok()
        && FREE_INDICES.try_with(|_| ()).is_ok()
        && NEXT_INDEX.try_with(|_| ()).is_ok()
        && DESTROY_CALLBACKS.try_with(|_| ()).is_ok()
        && storage::is_reachable()
}

fn generation_of(index: usize) -> Option<u32> {
    GENERATIONS.with(|generations| generations.borrow().get(index).copied())
}

// =============================================================================
// Allocation
// =============================================================================

/// Allocate an identity for a new instance.
///
/// `kind` names the instance type and prefixes the generated label.
pub fn allocate_instance(kind: &str) -> InstanceId {
    let label = LABEL_COUNTER.with(|counter| {
        let mut counter = counter.borrow_mut();
        let label = format!("{}#{}", kind, *counter);
        *counter += 1;
        label
    });

    // Reuse free index or allocate new
    let index = FREE_INDICES.with(|free| {
        let mut free = free.borrow_mut();
        if let Some(index) = free.pop() {
            index
        } else {
            NEXT_INDEX.with(|next| {
                let mut next = next.borrow_mut();
                let index = *next;
                *next += 1;
                index
            })
        }
    });

    let generation = GENERATIONS.with(|generations| {
        let mut generations = generations.borrow_mut();
        if index >= generations.len() {
            generations.resize(index + 1, 0);
        }
        generations[index]
    });

    INDEX_TO_LABEL.with(|map| {
        map.borrow_mut().insert(index, label);
    });
    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().insert(index);
    });

    let id = InstanceId::new(index, generation);
    tracing::debug!(%id, kind, "instance allocated");
    id
}

/// Release an instance identity.
///
/// The id stops being live first, then destroy hooks run (registration
/// order), then the instance's storage is torn down. Releasing an id that is
/// not live is a logged no-op.
pub fn release_instance(id: InstanceId) {
    let index = id.index();
    if !is_live(id) {
        tracing::warn!(%id, "release of an instance that is not live");
        return;
    }

    // Bumping the generation retires `id` and every copy of it.
    GENERATIONS.with(|generations| {
        let mut generations = generations.borrow_mut();
        generations[index] = generations[index].wrapping_add(1);
    });
    INDEX_TO_LABEL.with(|map| {
        map.borrow_mut().remove(&index);
    });
    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().remove(&index);
    });

    // Hooks may still read storage, so they run before teardown.
    run_destroy_callbacks(index);
    storage::destroy_storage(id);

    FREE_INDICES.with(|free| {
        free.borrow_mut().push(index);
    });

    tracing::debug!(%id, "instance released");

    // When every instance is gone, start numbering from zero again.
    // Generations survive, so old ids stay dead.
    let is_empty = ALLOCATED_INDICES.with(|set| set.borrow().is_empty());
    if is_empty {
        FREE_INDICES.with(|free| free.borrow_mut().clear());
        NEXT_INDEX.with(|next| *next.borrow_mut() = 0);
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Owned registration of one instance.
///
/// Adapters embed it in the platform object they construct. Dropping it
/// releases the instance, unless something released it first.
#[derive(Debug)]
pub struct Registration {
    id: InstanceId,
}

impl Registration {
    /// Allocate a fresh identity owned by the returned guard.
    pub fn new(kind: &str) -> Self {
        Self {
            id: allocate_instance(kind),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if tables_reachable() && is_live(self.id) {
            release_instance(self.id);
        }
    }
}

// =============================================================================
// Destroy Callbacks
// =============================================================================

/// Register a callback to run when the instance is released.
///
/// Fails with [`BindingError::UnknownInstance`] if `id` is not live.
pub fn on_destroy(id: InstanceId, callback: impl FnOnce() + 'static) -> Result<(), BindingError> {
    if !is_live(id) {
        return Err(BindingError::UnknownInstance { id });
    }
    DESTROY_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(id.index())
            .or_default()
            .push(Box::new(callback));
    });
    Ok(())
}

/// Run and clear destroy callbacks for an index.
fn run_destroy_callbacks(index: usize) {
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(&index));
    if let Some(callbacks) = callbacks {
        for callback in callbacks {
            callback();
        }
    }
}

// =============================================================================
// Lookups
// =============================================================================

/// Label of a live instance.
pub fn instance_label(id: InstanceId) -> Option<String> {
    if !is_live(id) {
        return None;
    }
    INDEX_TO_LABEL.with(|map| map.borrow().get(&id.index()).cloned())
}

/// Check if an instance is currently live.
///
/// False for ids whose slot has since been reused.
pub fn is_live(id: InstanceId) -> bool {
    let index = id.index();
    ALLOCATED_INDICES.with(|set| set.borrow().contains(&index)) && generation_of(index) == Some(id.generation())
}

/// All live instances, in index order.
///
/// Note: This creates a reactive dependency when called from a derived/effect.
pub fn live_instances() -> Vec<InstanceId> {
    let mut indices: Vec<usize> = ALLOCATED_INDICES.with(|set| set.borrow().iter().copied().collect());
    indices.sort_unstable();
    indices
        .into_iter()
        .filter_map(|index| generation_of(index).map(|generation| InstanceId::new(index, generation)))
        .collect()
}

/// Count of live instances.
pub fn live_count() -> usize {
    ALLOCATED_INDICES.with(|set| set.borrow().len())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry state (for testing).
///
/// Destroy hooks are dropped without running.
pub fn reset_registry() {
    INDEX_TO_LABEL.with(|map| map.borrow_mut().clear());
    ALLOCATED_INDICES.with(|set| set.borrow_mut().clear());
    GENERATIONS.with(|generations| generations.borrow_mut().clear());
    FREE_INDICES.with(|free| free.borrow_mut().clear());
    NEXT_INDEX.with(|next| *next.borrow_mut() = 0);
    LABEL_COUNTER.with(|counter| *counter.borrow_mut() = 0);
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| std::mem::take(&mut *callbacks.borrow_mut()));
    drop(callbacks);
    storage::reset_storage();
}
