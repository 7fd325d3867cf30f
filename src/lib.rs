//! # spark-bind
//!
//! Declarative binding runtime for imperative, delegate-based UI toolkits.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! reactive value streams.
//!
//! ## Architecture
//!
//! An instance is described by an ordered list of bindings, each tagged with
//! *when* it takes effect. A binder turns that list into a configured live
//! instance plus one disposable [`Lifetime`]:
//!
//! ```text
//! [Binding] → prepare → construct → install delegates → apply → Lifetime
//! ```
//!
//! Platform instances can't be extended with fields, so runtime state lives
//! in identity-keyed side tables (registry and storage), like every other
//! piece of per-instance state.
//!
//! ## Modules
//!
//! - [`types`] - Core types (InstanceId, ControlState, ControlScope, Animation)
//! - [`engine`] - Instance registry and per-instance storage
//! - [`binding`] - Timing primitives, value streams, the binder state machine
//! - [`delegate`] - Dynamic delegate multiplexer
//! - [`diff`] - Scoped value and collection differs
//! - [`lifetime`] - Disposable handles and aggregation
//! - [`config`] / [`error`] - Runtime configuration and misuse errors

pub mod binding;
pub mod config;
pub mod delegate;
pub mod diff;
pub mod engine;
pub mod error;
pub mod lifetime;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use engine::{
    allocate_instance, create_storage, instance_label, is_live, live_count, live_instances, on_destroy,
    release_instance, reset_registry, storage, storage_count, Registration, Storage,
};

pub use binding::{
    apply_constructed, apply_dynamic, apply_notification, apply_output, apply_streamed, apply_synchronous,
    Binder, Binding, BindingKind, Bound, Built, Constructed, Constructor, Dynamic, EventStream, LiveInstance,
    NoBinding, Output, PrepareContext, Prepared, Preparer, Root, Source, Streamed, Synchronous,
};

pub use delegate::{delegate_phase, AnyDelegate, DelegateMethod, DelegatePhase, HandlerMode, Multiplexer};

pub use diff::{
    apply_mutation, apply_scoped, apply_scoped_binding, apply_section_mutation, apply_sections,
    apply_sections_binding, apply_subrange, apply_subrange_binding, diff_scoped, Change, IndexSet,
    LiveCollection, LiveSections, ScopedValues, Section, SectionMutation, SectionedState, SubrangeMutation,
    SubrangeState,
};

pub use config::{config, reset_config, set_config, RuntimeConfig};
pub use error::{fail_fast, BindingError};
pub use lifetime::{aggregate, AggregateLifetime, Cleanup, Lifetime};
