//! Differs - turn declarative snapshots and mutations into minimal
//! imperative platform calls.
//!
//! - [`scoped`] - per-scope property values (`(state, value)` pairs)
//! - [`subrange`] - flat collections driven by incremental mutations
//! - [`sections`] - two-level collections (sections of rows)
//!
//! Differs keep their committed state in the instance's
//! [`Storage`](crate::engine::Storage) cache, keyed by property name.

pub mod scoped;
pub mod sections;
pub mod subrange;

pub use scoped::{apply_scoped, apply_scoped_binding, diff_scoped, ScopedValues};
pub use sections::{
    apply_section_mutation, apply_sections, apply_sections_binding, LiveSections, Section, SectionMutation,
    SectionedState,
};
pub use subrange::{
    apply_mutation, apply_subrange, apply_subrange_binding, Change, IndexSet, LiveCollection, SubrangeMutation,
    SubrangeState,
};
