//! Storage Registry - auxiliary per-instance state.
//!
//! The runtime cannot add fields to the instances it configures, so every
//! instance gets one [`Storage`] in an identity-keyed side table. The entry
//! is created at construction and removed exactly once, by
//! [`release_instance`](super::release_instance). Entries are keyed by the
//! full generational id, so a stale id never reaches a newer instance's state.
//!
//! Storage holds:
//! - construction-time values (to reject later changes)
//! - delegate multiplexers, one per protocol
//! - cached diff state and retained output channels, keyed by property
//! - lifetimes retained until the instance is destroyed

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::delegate::{AnyDelegate, DelegateMethod, DelegatePhase, Multiplexer};
use crate::lifetime::Lifetime;
use crate::types::InstanceId;

// =============================================================================
// Storage
// =============================================================================

struct ConstructedValue {
    value: Box<dyn Any>,
    debug: String,
}

/// Runtime-owned state attached to one instance.
pub struct Storage {
    id: InstanceId,
    constructed: RefCell<HashMap<&'static str, ConstructedValue>>,
    delegates: RefCell<HashMap<TypeId, Rc<dyn AnyDelegate>>>,
    cache: RefCell<HashMap<&'static str, Box<dyn Any>>>,
    retained: RefCell<Vec<Lifetime>>,
}

impl Storage {
    fn new(id: InstanceId) -> Self {
        Self {
            id,
            constructed: RefCell::new(HashMap::new()),
            delegates: RefCell::new(HashMap::new()),
            cache: RefCell::new(HashMap::new()),
            retained: RefCell::new(Vec::new()),
        }
    }

    /// Identity of the owning instance.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    // -------------------------------------------------------------------------
    // Construction-time values
    // -------------------------------------------------------------------------

    pub(crate) fn record_constructed(&self, name: &'static str, value: Box<dyn Any>, debug: String) {
        self.constructed
            .borrow_mut()
            .insert(name, ConstructedValue { value, debug });
    }

    /// Value a construction-time binding had when the instance was built.
    pub fn constructed_value<V: Clone + 'static>(&self, name: &'static str) -> Option<V> {
        self.constructed
            .borrow()
            .get(name)
            .and_then(|entry| entry.value.downcast_ref::<V>().cloned())
    }

    /// Compare against the recorded value: `None` if nothing was recorded,
    /// otherwise `Some((equal, recorded_debug))`.
    pub(crate) fn compare_constructed<V: PartialEq + 'static>(
        &self,
        name: &'static str,
        value: &V,
    ) -> Option<(bool, String)> {
        self.constructed.borrow().get(name).map(|entry| {
            let equal = entry.value.downcast_ref::<V>() == Some(value);
            (equal, entry.debug.clone())
        })
    }

    // -------------------------------------------------------------------------
    // Delegates
    // -------------------------------------------------------------------------

    /// Multiplexer for protocol `M`, if one was selected for this instance.
    pub fn delegate<M: DelegateMethod>(&self) -> Option<Rc<Multiplexer<M>>> {
        let entry = self.delegates.borrow().get(&TypeId::of::<M>()).cloned()?;
        entry.into_any().downcast::<Multiplexer<M>>().ok()
    }

    pub(crate) fn adopt_delegate(&self, protocol: TypeId, delegate: Rc<dyn AnyDelegate>) {
        self.delegates.borrow_mut().entry(protocol).or_insert(delegate);
    }

    pub(crate) fn has_delegate(&self, protocol: TypeId) -> bool {
        self.delegates.borrow().contains_key(&protocol)
    }

    pub(crate) fn delegates(&self) -> Vec<Rc<dyn AnyDelegate>> {
        self.delegates.borrow().values().cloned().collect()
    }

    /// Assign the multiplexer for `M` as the instance's delegate.
    ///
    /// `install` receives the multiplexer and performs the platform
    /// assignment. Returns `false` if no multiplexer was selected or it was
    /// already installed.
    pub fn install_delegate<M: DelegateMethod>(&self, install: impl FnOnce(Rc<Multiplexer<M>>)) -> bool {
        let Some(multiplexer) = self.delegate::<M>() else {
            return false;
        };
        if multiplexer.phase() == DelegatePhase::Installed {
            return false;
        }
        install(multiplexer.clone());
        multiplexer.mark_installed();
        tracing::trace!(id = %self.id, protocol = multiplexer.protocol(), "delegate installed");
        true
    }

    // -------------------------------------------------------------------------
    // Cache
    // -------------------------------------------------------------------------

    /// Store a value under a property key, replacing any previous value.
    pub fn set_cached<T: 'static>(&self, key: &'static str, value: T) {
        self.cache.borrow_mut().insert(key, Box::new(value));
    }

    /// Remove and return the value under a property key.
    pub fn take_cached<T: 'static>(&self, key: &'static str) -> Option<T> {
        let entry = self.cache.borrow_mut().remove(key)?;
        match entry.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(entry) => {
                // Different type under the same key: leave it in place.
                self.cache.borrow_mut().insert(key, entry);
                None
            }
        }
    }

    /// Clone of the value under a property key.
    pub fn cached<T: Clone + 'static>(&self, key: &'static str) -> Option<T> {
        self.cache
            .borrow()
            .get(key)
            .and_then(|entry| entry.downcast_ref::<T>().cloned())
    }

    /// Mutate the value under a property key, starting from `T::default()`.
    ///
    /// The cache is not borrowed while `f` runs, so `f` may use this storage.
    pub fn with_cached<T: Default + 'static, R>(&self, key: &'static str, f: impl FnOnce(&mut T) -> R) -> R {
        let mut value = self.take_cached::<T>(key).unwrap_or_default();
        let result = f(&mut value);
        self.set_cached(key, value);
        result
    }

    // -------------------------------------------------------------------------
    // Retained lifetimes
    // -------------------------------------------------------------------------

    /// Keep a lifetime alive until the instance is destroyed.
    pub fn retain(&self, lifetime: Lifetime) {
        self.retained.borrow_mut().push(lifetime);
    }

    pub fn retained_count(&self) -> usize {
        self.retained.borrow().len()
    }

    fn teardown(&self) {
        let retained = std::mem::take(&mut *self.retained.borrow_mut());
        for lifetime in &retained {
            lifetime.dispose();
        }
        drop(retained);
        // Dropped values may call back into this storage; release borrows first.
        let cache = std::mem::take(&mut *self.cache.borrow_mut());
        let delegates = std::mem::take(&mut *self.delegates.borrow_mut());
        let constructed = std::mem::take(&mut *self.constructed.borrow_mut());
        drop((cache, delegates, constructed));
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("id", &self.id)
            .field("delegates", &self.delegates.borrow().len())
            .field("cached", &self.cache.borrow().len())
            .field("retained", &self.retained.borrow().len())
            .finish()
    }
}

// =============================================================================
// Side Table
// =============================================================================

thread_local! {
    /// Map instance id → Storage
    static STORAGES: RefCell<HashMap<InstanceId, Rc<Storage>>> = RefCell::new(HashMap::new());
}

/// Create the storage for a freshly constructed instance.
///
/// Returns the existing storage if one is already associated.
pub fn create_storage(id: InstanceId) -> Rc<Storage> {
    STORAGES.with(|storages| {
        storages
            .borrow_mut()
            .entry(id)
            .or_insert_with(|| Rc::new(Storage::new(id)))
            .clone()
    })
}

/// Storage associated with an instance.
pub fn storage(id: InstanceId) -> Option<Rc<Storage>> {
    STORAGES.with(|storages| storages.borrow().get(&id).cloned())
}

/// Remove and tear down an instance's storage.
///
/// Called by `release_instance`. Retained lifetimes are disposed in the
/// order they were retained.
pub(crate) fn destroy_storage(id: InstanceId) {
    let removed = STORAGES.with(|storages| storages.borrow_mut().remove(&id));
    if let Some(storage) = removed {
        storage.teardown();
    }
}

/// False once the side table is gone (thread teardown).
pub(crate) fn is_reachable() -> bool {
    STORAGES.try_with(|_| ()).is_ok()
}

/// Number of storages in the side table.
pub fn storage_count() -> usize {
    STORAGES.with(|storages| storages.borrow().len())
}

/// Drop every storage without tearing down (for testing).
pub(crate) fn reset_storage() {
    let storages = STORAGES.with(|storages| std::mem::take(&mut *storages.borrow_mut()));
    for storage in storages.values() {
        storage.teardown();
    }
}
