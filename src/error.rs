//! Binding runtime errors.
//!
//! Every variant is a development-time contract violation: adapter code
//! misused the runtime, or the runtime itself reached a state it must never
//! reach. None of them are recoverable at runtime, so the public entry points
//! route them through [`fail_fast`]. The `try_*` variants of those entry
//! points hand the error back instead, so hosts and tests can inspect it.

use thiserror::Error;

use crate::types::InstanceId;

/// Misuse or invariant violation detected by the binding runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// Two construction-time bindings of the same name with different values.
    #[error("conflicting construction-time bindings for `{name}`: {first} vs {second}")]
    ConflictingConstruction {
        name: &'static str,
        first: String,
        second: String,
    },

    /// A construction-time binding changed after the instance was built.
    #[error("`{name}` can only be set at construction; instance {id} already has {current}, got {requested}")]
    ConstructedAfterConstruction {
        name: &'static str,
        id: InstanceId,
        current: String,
        requested: String,
    },

    /// Second single-handler registration for the same method.
    #[error("delegate method `{method}` already has a handler on instance {id}")]
    DuplicateSingleHandler { method: String, id: InstanceId },

    /// Single and multi handlers mixed on one method.
    #[error("delegate method `{method}` cannot mix single and multi handlers")]
    HandlerModeConflict { method: String },

    /// Multi-handler registered for a method that must return a value.
    #[error("delegate method `{method}` returns a value and needs a single handler")]
    NotifyForValueMethod { method: String },

    /// Handler registered for a protocol no binding selected during prepare.
    #[error("delegate protocol `{protocol}` was not selected during prepare")]
    DelegateNotSelected { protocol: &'static str },

    /// A selected delegate was never assigned to the instance.
    #[error("delegate protocol `{protocol}` was selected but never installed on instance {id}")]
    DelegateNotInstalled { protocol: &'static str, id: InstanceId },

    /// The platform invoked a value-returning method nobody handles.
    #[error("delegate method `{method}` invoked without a registered handler")]
    UnhandledMethod { method: String },

    /// Handler was registered with a different argument/return type.
    #[error("delegate method `{method}` invoked with a signature that does not match its handler")]
    HandlerSignatureMismatch { method: String },

    /// Mutation index outside the committed state.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Update/insert payload does not match its index set.
    #[error("mutation names {indices} indices but carries {elements} elements")]
    ElementCountMismatch { indices: usize, elements: usize },

    /// Nested mutation cannot describe a section's initial contents.
    #[error("nested mutation `{kind}` cannot seed a new section")]
    InvalidNestedMutation { kind: &'static str },

    /// Instance id is not (or no longer) registered.
    #[error("instance {id} is not live")]
    UnknownInstance { id: InstanceId },
}

impl BindingError {
    /// Short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            BindingError::ConflictingConstruction { .. } => "conflicting_construction",
            BindingError::ConstructedAfterConstruction { .. } => "constructed_after_construction",
            BindingError::DuplicateSingleHandler { .. } => "duplicate_single_handler",
            BindingError::HandlerModeConflict { .. } => "handler_mode_conflict",
            BindingError::NotifyForValueMethod { .. } => "notify_for_value_method",
            BindingError::DelegateNotSelected { .. } => "delegate_not_selected",
            BindingError::DelegateNotInstalled { .. } => "delegate_not_installed",
            BindingError::UnhandledMethod { .. } => "unhandled_method",
            BindingError::HandlerSignatureMismatch { .. } => "handler_signature_mismatch",
            BindingError::IndexOutOfRange { .. } => "index_out_of_range",
            BindingError::ElementCountMismatch { .. } => "element_count_mismatch",
            BindingError::InvalidNestedMutation { .. } => "invalid_nested_mutation",
            BindingError::UnknownInstance { .. } => "unknown_instance",
        }
    }
}

/// Log the violation and abort the current binder pass.
#[track_caller]
pub fn fail_fast(err: BindingError) -> ! {
    tracing::error!(label = err.as_label(), "{err}");
    panic!("{err}");
}

/// Unwrap a runtime result, aborting on contract violation.
#[track_caller]
pub(crate) fn or_fail<T>(result: Result<T, BindingError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => fail_fast(err),
    }
}
