//! Per-kind application of bindings to a live instance.
//!
//! Adapters call these from `Preparer::apply_binding`, passing the setter or
//! registration closure for the property involved. Each returns the
//! binding's [`Lifetime`], or `None` when nothing stays live.

use std::rc::Rc;

use super::stream::{detached, Source};
use super::types::{Constructed, Dynamic, Output, Streamed, Synchronous};
use crate::delegate::DelegateMethod;
use crate::engine::Storage;
use crate::error::BindingError;
use crate::lifetime::Lifetime;

/// Construction-time bindings were consumed by the constructor.
///
/// `apply` runs only for properties the platform also exposes as settable;
/// most constructed values need nothing here.
pub fn apply_constructed<I, V: Clone>(
    binding: &Constructed<V>,
    instance: &I,
    apply: impl FnOnce(&I, V),
) -> Option<Lifetime> {
    apply(instance, binding.0.clone());
    None
}

/// Apply the initial value now, then every update until disposed.
///
/// The setter runs untracked: only emissions of the binding's own source
/// call it again, never changes to state the setter happens to read.
pub fn apply_dynamic<I, V>(
    binding: &Dynamic<V>,
    instance: &I,
    set: impl Fn(&I, V) + 'static,
) -> Option<Lifetime>
where
    I: Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    detached(|| set(instance, binding.initial()));
    let source = binding.subsequent()?;
    Some(subscribe_setter(&source, instance, set))
}

/// Apply every update until disposed; nothing is applied immediately.
pub fn apply_streamed<I, V>(
    binding: &Streamed<V>,
    instance: &I,
    set: impl Fn(&I, V) + 'static,
) -> Option<Lifetime>
where
    I: Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    Some(subscribe_setter(binding.source(), instance, set))
}

fn subscribe_setter<I, V>(source: &Source<V>, instance: &I, set: impl Fn(&I, V) + 'static) -> Lifetime
where
    I: Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    let instance = instance.clone();
    source.subscribe(true, move |value| set(&instance, value))
}

/// Connect the instance's native event to the output's sink.
///
/// `register` attaches the sink and returns the lifetime that detaches it.
pub fn apply_output<V: 'static>(
    binding: &Output<V>,
    register: impl FnOnce(Rc<dyn Fn(V)>) -> Lifetime,
) -> Option<Lifetime> {
    Some(register(binding.sink()))
}

/// Register a synchronous handler as the single handler of `method`.
///
/// The delegate for `M` must have been selected during prepare.
pub fn apply_synchronous<M, A, R>(
    binding: &Synchronous<A, R>,
    storage: &Storage,
    method: M,
) -> Result<Option<Lifetime>, BindingError>
where
    M: DelegateMethod,
    A: 'static,
    R: 'static,
{
    let multiplexer = storage
        .delegate::<M>()
        .ok_or(BindingError::DelegateNotSelected { protocol: M::protocol() })?;
    let handler = binding.handler();
    multiplexer.add_single(method, move |args: A| handler(args)).map(Some)
}

/// Register a handler among possibly many for a notification `method`.
pub fn apply_notification<M, A>(
    binding: &Synchronous<A>,
    storage: &Storage,
    method: M,
) -> Result<Option<Lifetime>, BindingError>
where
    M: DelegateMethod,
    A: 'static,
{
    let multiplexer = storage
        .delegate::<M>()
        .ok_or(BindingError::DelegateNotSelected { protocol: M::protocol() })?;
    let handler = binding.handler();
    multiplexer.add_multi(method, move |args: A| handler(args)).map(Some)
}
