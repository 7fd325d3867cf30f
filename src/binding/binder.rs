//! Binder - the prepare / construct / apply state machine.
//!
//! Binding an instance runs three phases, strictly in order:
//!
//! 1. **Prepare**: every binding is offered to its adapter's preparer, which
//!    records construction-time configuration and selects delegate protocols.
//!    An identity is allocated up front so delegates know their owner.
//! 2. **Construct**: the adapter builds the instance from what prepare
//!    collected. Storage is created, selected delegates are installed.
//! 3. **Apply**: every binding is applied to the live instance; the
//!    resulting lifetimes fold into one aggregate.
//!
//! The phases are separate types ([`Binder`] → [`Prepared`] → [`Built`] →
//! [`Bound`]), so out-of-order use does not compile. A failure in any phase
//! releases the allocated identity.
//!
//! # Inheritance
//!
//! Adapters compose by delegation: each preparer holds its parent's
//! preparer, and its binding enum has an `Inherited(ParentBinding)` case.
//! The binder routes inherited bindings up the chain, so the parent sees
//! them exactly as if they were its own. The chain ends at [`Root`].

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::types::{Binding, NoBinding};
use crate::delegate::{AnyDelegate, DelegateMethod, DelegatePhase, Multiplexer};
use crate::engine::{create_storage, is_live, release_instance, Registration, Storage};
use crate::error::{or_fail, BindingError};
use crate::lifetime::{AggregateLifetime, Lifetime};
use crate::types::InstanceId;

// =============================================================================
// Adapter Traits
// =============================================================================

/// Handle to a platform instance the runtime can bind.
pub trait LiveInstance: Clone + 'static {
    fn instance_id(&self) -> InstanceId;

    /// Handle that does not hold the instance's [`Registration`].
    ///
    /// Bindings are applied through this handle, so the closures they keep
    /// alive never keep the instance registered. Adapters that embed a
    /// registration must override it.
    fn unowned(&self) -> Self {
        self.clone()
    }
}

/// Per-adapter scratch space and binding logic.
///
/// A fresh preparer (`Default`) is created for every binder run and
/// discarded once apply completes.
pub trait Preparer: Default + 'static {
    type Instance: LiveInstance;
    type Binding: Binding;
    type Inherited: Preparer;

    /// Set by [`Root`] only; stops walks up the chain.
    const IS_ROOT: bool = false;

    fn inherited(&self) -> &Self::Inherited;
    fn inherited_mut(&mut self) -> &mut Self::Inherited;

    /// Payload of the `Inherited` case, if `binding` is one.
    fn inherited_binding(binding: &Self::Binding) -> Option<&<Self::Inherited as Preparer>::Binding>;

    /// View of the instance as its parent type.
    fn upcast(instance: &Self::Instance) -> &<Self::Inherited as Preparer>::Instance;

    /// Record what `binding` contributes to construction.
    fn prepare_binding(&mut self, binding: &Self::Binding, context: &mut PrepareContext) -> Result<(), BindingError> {
        let _ = (binding, context);
        Ok(())
    }

    /// Assign the delegates this adapter selected (see
    /// [`Storage::install_delegate`]). Runs before the parent's hook.
    fn install_delegates(&self, instance: &Self::Instance, storage: &Storage) {
        let _ = (instance, storage);
    }

    /// Apply one of this adapter's own bindings to the live instance.
    fn apply_binding(
        &self,
        binding: &Self::Binding,
        instance: &Self::Instance,
        storage: &Rc<Storage>,
    ) -> Result<Option<Lifetime>, BindingError>;
}

/// A preparer that can also build its instance.
pub trait Constructor: Preparer {
    /// Instance kind, used in labels and logs.
    const KIND: &'static str;

    /// Caller-supplied construction arguments.
    type Parameters;

    /// Build the instance from prepared state.
    ///
    /// The instance keeps `registration` for as long as the platform object
    /// lives; dropping the last clone releases the instance.
    fn construct_instance(&mut self, registration: Rc<Registration>, parameters: Self::Parameters) -> Self::Instance;
}

// =============================================================================
// Root
// =============================================================================

/// End of every inheritance chain. Has no bindings.
pub struct Root<I>(PhantomData<fn() -> I>);

impl<I> Default for Root<I> {
    fn default() -> Self {
        Root(PhantomData)
    }
}

impl<I> fmt::Debug for Root<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Root")
    }
}

impl<I: LiveInstance> Preparer for Root<I> {
    type Instance = I;
    type Binding = NoBinding;
    type Inherited = Root<I>;

    const IS_ROOT: bool = true;

    fn inherited(&self) -> &Self {
        self
    }

    fn inherited_mut(&mut self) -> &mut Self {
        self
    }

    fn inherited_binding(binding: &NoBinding) -> Option<&NoBinding> {
        match *binding {}
    }

    fn upcast(instance: &I) -> &I {
        instance
    }

    fn apply_binding(&self, binding: &NoBinding, _: &I, _: &Rc<Storage>) -> Result<Option<Lifetime>, BindingError> {
        match *binding {}
    }
}

// =============================================================================
// Prepare Context
// =============================================================================

struct RecordedValue {
    name: &'static str,
    value: Box<dyn Any>,
    debug: String,
}

/// What the prepare pass collects besides adapter scratch space.
pub struct PrepareContext {
    id: InstanceId,
    existing: Option<Rc<Storage>>,
    constructed: Vec<RecordedValue>,
    delegates: Vec<(TypeId, Rc<dyn AnyDelegate>)>,
}

impl PrepareContext {
    fn for_construction(id: InstanceId) -> Self {
        Self {
            id,
            existing: None,
            constructed: Vec::new(),
            delegates: Vec::new(),
        }
    }

    fn for_existing(storage: Rc<Storage>) -> Self {
        Self {
            id: storage.id(),
            existing: Some(storage),
            constructed: Vec::new(),
            delegates: Vec::new(),
        }
    }

    /// Identity of the instance being bound.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Whether the instance already exists (bindings applied after the fact).
    pub fn is_constructed(&self) -> bool {
        self.existing.is_some()
    }

    /// Record a construction-time value.
    ///
    /// Repeating an equal value is allowed. A different value for the same
    /// name is rejected, as is any value that differs from what an existing
    /// instance was constructed with.
    pub fn record_constructed<V>(&mut self, name: &'static str, value: &V) -> Result<(), BindingError>
    where
        V: Clone + PartialEq + fmt::Debug + 'static,
    {
        let requested = format!("{value:?}");

        if let Some(storage) = &self.existing {
            return match storage.compare_constructed(name, value) {
                Some((true, _)) => Ok(()),
                Some((false, current)) => Err(BindingError::ConstructedAfterConstruction {
                    name,
                    id: self.id,
                    current,
                    requested,
                }),
                None => Err(BindingError::ConstructedAfterConstruction {
                    name,
                    id: self.id,
                    current: "the platform default".to_string(),
                    requested,
                }),
            };
        }

        if let Some(recorded) = self.constructed.iter().find(|recorded| recorded.name == name) {
            if recorded.value.downcast_ref::<V>() == Some(value) {
                return Ok(());
            }
            return Err(BindingError::ConflictingConstruction {
                name,
                first: recorded.debug.clone(),
                second: requested,
            });
        }

        self.constructed.push(RecordedValue {
            name,
            value: Box::new(value.clone()),
            debug: requested,
        });
        Ok(())
    }

    /// Construction-time value recorded so far under `name`.
    pub fn constructed<V: Clone + 'static>(&self, name: &'static str) -> Option<V> {
        if let Some(storage) = &self.existing {
            return storage.constructed_value(name);
        }
        self.constructed
            .iter()
            .find(|recorded| recorded.name == name)
            .and_then(|recorded| recorded.value.downcast_ref::<V>().cloned())
    }

    /// Mark protocol `M` as needed; its multiplexer is created once.
    pub fn select_delegate<M: DelegateMethod>(&mut self) {
        let protocol = TypeId::of::<M>();
        let in_storage = self
            .existing
            .as_ref()
            .is_some_and(|storage| storage.has_delegate(protocol));
        if in_storage || self.delegates.iter().any(|(selected, _)| *selected == protocol) {
            return;
        }
        let delegate: Rc<dyn AnyDelegate> = Multiplexer::<M>::new(self.id);
        self.delegates.push((protocol, delegate));
        tracing::trace!(id = %self.id, protocol = M::protocol(), "delegate class selected");
    }

    /// Whether protocol `M` has been selected for this instance.
    pub fn has_delegate<M: DelegateMethod>(&self) -> bool {
        let protocol = TypeId::of::<M>();
        self.delegates.iter().any(|(selected, _)| *selected == protocol)
            || self
                .existing
                .as_ref()
                .is_some_and(|storage| storage.has_delegate(protocol))
    }

    fn commit(self, storage: &Storage) {
        for recorded in self.constructed {
            storage.record_constructed(recorded.name, recorded.value, recorded.debug);
        }
        for (protocol, delegate) in self.delegates {
            storage.adopt_delegate(protocol, delegate);
        }
    }
}

impl fmt::Debug for PrepareContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrepareContext")
            .field("id", &self.id)
            .field("existing", &self.existing.is_some())
            .field("constructed", &self.constructed.iter().map(|r| r.name).collect::<Vec<_>>())
            .field("delegates", &self.delegates.len())
            .finish()
    }
}

// =============================================================================
// Chain Walks
// =============================================================================

fn prepare_chain<P: Preparer>(
    preparer: &mut P,
    binding: &P::Binding,
    context: &mut PrepareContext,
) -> Result<(), BindingError> {
    if let Some(parent) = P::inherited_binding(binding) {
        return prepare_chain(preparer.inherited_mut(), parent, context);
    }
    tracing::trace!(binding = binding.name(), kind = ?binding.kind(), "prepare");
    preparer.prepare_binding(binding, context)
}

fn apply_chain<P: Preparer>(
    preparer: &P,
    binding: &P::Binding,
    instance: &P::Instance,
    storage: &Rc<Storage>,
) -> Result<Option<Lifetime>, BindingError> {
    if let Some(parent) = P::inherited_binding(binding) {
        return apply_chain(preparer.inherited(), parent, P::upcast(instance), storage);
    }
    tracing::trace!(binding = binding.name(), kind = ?binding.kind(), "apply");
    preparer.apply_binding(binding, instance, storage)
}

fn install_chain<P: Preparer>(preparer: &P, instance: &P::Instance, storage: &Storage) {
    preparer.install_delegates(instance, storage);
    if !P::IS_ROOT {
        install_chain(preparer.inherited(), P::upcast(instance), storage);
    }
}

fn verify_installed(storage: &Storage) -> Result<(), BindingError> {
    match storage
        .delegates()
        .into_iter()
        .find(|delegate| delegate.phase() != DelegatePhase::Installed)
    {
        Some(delegate) => Err(BindingError::DelegateNotInstalled {
            protocol: delegate.protocol(),
            id: storage.id(),
        }),
        None => Ok(()),
    }
}

fn apply_all<P: Preparer>(
    preparer: &P,
    bindings: &[P::Binding],
    instance: &P::Instance,
    storage: &Rc<Storage>,
) -> Result<Option<Lifetime>, BindingError> {
    // On error the partial aggregate drops here, disposing what was applied.
    let mut lifetimes = AggregateLifetime::new();
    for binding in bindings {
        lifetimes.push(apply_chain(preparer, binding, instance, storage)?);
    }
    tracing::debug!(id = %storage.id(), bindings = bindings.len(), live = lifetimes.len(), "bindings applied");
    Ok(lifetimes.into_lifetime())
}

// =============================================================================
// Reservation
// =============================================================================

/// Allocated identity, released on drop unless the binder completes.
///
/// Release is explicit: a failed binder frees the identity even if the
/// adapter leaked a clone of the registration.
struct Reservation {
    id: InstanceId,
    registration: Rc<Registration>,
    armed: bool,
}

impl Reservation {
    fn allocate(kind: &'static str) -> Self {
        let registration = Rc::new(Registration::new(kind));
        Self {
            id: registration.id(),
            registration,
            armed: true,
        }
    }

    /// From here on the instance's own registration decides its lifetime.
    fn complete(mut self) {
        self.armed = false;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.armed && is_live(self.id) {
            tracing::debug!(id = %self.id, "binder abandoned; releasing instance");
            release_instance(self.id);
        }
    }
}

// =============================================================================
// Phases
// =============================================================================

/// Ordered bindings for one instance, before prepare.
pub struct Binder<P: Preparer> {
    bindings: Vec<P::Binding>,
}

impl<P: Preparer> Binder<P> {
    pub fn new(bindings: impl IntoIterator<Item = P::Binding>) -> Self {
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }

    pub fn bindings(&self) -> &[P::Binding] {
        &self.bindings
    }

    /// Append a binding; it applies after those already present.
    pub fn push(&mut self, binding: P::Binding) {
        self.bindings.push(binding);
    }

    /// Bind an already constructed instance.
    ///
    /// Construction-time bindings must match what the instance was built
    /// with. New delegate protocols are selected and installed as usual.
    pub fn try_apply_to(self, instance: &P::Instance) -> Result<Option<Lifetime>, BindingError> {
        let id = instance.instance_id();
        if !is_live(id) {
            return Err(BindingError::UnknownInstance { id });
        }
        let storage = create_storage(id);

        let mut preparer = P::default();
        let mut context = PrepareContext::for_existing(storage.clone());
        for binding in &self.bindings {
            prepare_chain(&mut preparer, binding, &mut context)?;
        }
        context.commit(&storage);

        install_chain(&preparer, instance, &storage);
        verify_installed(&storage)?;
        apply_all(&preparer, &self.bindings, &instance.unowned(), &storage)
    }

    /// [`try_apply_to`](Self::try_apply_to), aborting on misuse.
    #[track_caller]
    pub fn apply_to(self, instance: &P::Instance) -> Option<Lifetime> {
        or_fail(self.try_apply_to(instance))
    }
}

impl<P: Constructor> Binder<P> {
    /// Run the prepare pass.
    pub fn try_prepare(self) -> Result<Prepared<P>, BindingError> {
        let reservation = Reservation::allocate(P::KIND);
        let mut preparer = P::default();
        let mut context = PrepareContext::for_construction(reservation.id);
        for binding in &self.bindings {
            prepare_chain(&mut preparer, binding, &mut context)?;
        }
        Ok(Prepared {
            bindings: self.bindings,
            preparer,
            context,
            reservation,
        })
    }

    /// Prepare, construct and apply in one go.
    pub fn try_construct(self, parameters: P::Parameters) -> Result<Bound<P::Instance>, BindingError> {
        self.try_prepare()?.try_construct(parameters)?.try_apply()
    }

    /// [`try_construct`](Self::try_construct), aborting on misuse.
    #[track_caller]
    pub fn construct(self, parameters: P::Parameters) -> Bound<P::Instance> {
        or_fail(self.try_construct(parameters))
    }
}

impl<P: Preparer> fmt::Debug for Binder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("bindings", &self.bindings.iter().map(|b| b.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Prepare pass done; the instance does not exist yet.
pub struct Prepared<P: Constructor> {
    bindings: Vec<P::Binding>,
    preparer: P,
    context: PrepareContext,
    reservation: Reservation,
}

impl<P: Constructor> Prepared<P> {
    /// Identity the instance will have.
    pub fn id(&self) -> InstanceId {
        self.reservation.id
    }

    pub fn preparer(&self) -> &P {
        &self.preparer
    }

    pub fn context(&self) -> &PrepareContext {
        &self.context
    }

    /// Build the instance and install its delegates.
    pub fn try_construct(self, parameters: P::Parameters) -> Result<Built<P>, BindingError> {
        let Prepared {
            bindings,
            mut preparer,
            context,
            reservation,
        } = self;
        let id = reservation.id;

        let instance = preparer.construct_instance(reservation.registration.clone(), parameters);
        let storage = create_storage(id);
        context.commit(&storage);

        install_chain(&preparer, &instance, &storage);
        verify_installed(&storage)?;
        tracing::debug!(%id, kind = P::KIND, "instance constructed");

        Ok(Built {
            bindings,
            preparer,
            instance,
            storage,
            reservation,
        })
    }
}

/// Instance constructed; bindings not yet applied.
pub struct Built<P: Constructor> {
    bindings: Vec<P::Binding>,
    preparer: P,
    instance: P::Instance,
    storage: Rc<Storage>,
    reservation: Reservation,
}

impl<P: Constructor> Built<P> {
    pub fn instance(&self) -> &P::Instance {
        &self.instance
    }

    pub fn storage(&self) -> &Rc<Storage> {
        &self.storage
    }

    /// Apply every binding. Preparer scratch space is discarded afterwards.
    pub fn try_apply(self) -> Result<Bound<P::Instance>, BindingError> {
        let lifetime = apply_all(&self.preparer, &self.bindings, &self.instance.unowned(), &self.storage)?;
        let Built {
            instance,
            storage,
            reservation,
            ..
        } = self;
        reservation.complete();
        Ok(Bound {
            instance,
            storage,
            lifetime,
        })
    }
}

// =============================================================================
// Bound
// =============================================================================

/// A constructed instance with its live bindings.
///
/// Dropping a `Bound` disposes the bindings; the instance stays registered
/// while other handles to it exist. Use
/// [`retain_until_destroyed`](Self::retain_until_destroyed) to tie the
/// bindings to the instance instead.
#[must_use = "dropping a Bound disposes its bindings"]
pub struct Bound<I: LiveInstance> {
    instance: I,
    storage: Rc<Storage>,
    lifetime: Option<Lifetime>,
}

impl<I: LiveInstance> Bound<I> {
    pub fn instance(&self) -> &I {
        &self.instance
    }

    pub fn id(&self) -> InstanceId {
        self.storage.id()
    }

    pub fn storage(&self) -> &Rc<Storage> {
        &self.storage
    }

    /// Aggregate lifetime; `None` when no binding stays live.
    pub fn lifetime(&self) -> Option<&Lifetime> {
        self.lifetime.as_ref()
    }

    pub fn into_parts(self) -> (I, Option<Lifetime>) {
        (self.instance, self.lifetime)
    }

    /// Keep the bindings alive until the instance is released, either
    /// explicitly or by dropping the last handle returned here.
    pub fn retain_until_destroyed(self) -> I {
        if let Some(lifetime) = self.lifetime {
            self.storage.retain(lifetime);
        }
        self.instance
    }

    /// Dispose the bindings and release the instance.
    pub fn destroy(self) {
        let id = self.id();
        drop(self.lifetime);
        release_instance(id);
    }
}

impl<I: LiveInstance + fmt::Debug> fmt::Debug for Bound<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("instance", &self.instance)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
