//! Two-level collections: sections of rows.
//!
//! A sectioned binding streams outer mutations whose elements are themselves
//! row mutations ([`SectionMutation`]). Outer `Insert`/`Reload` elements seed
//! new sections, outer `Update` elements are applied to the rows of the
//! section they target, and a metadata-only element takes the lighter
//! [`LiveSections::reload_section_metadata`] path.

use std::ops::Range;
use std::rc::Rc;

use super::subrange::{
    apply_mutation, check_indices, check_insert, check_move, check_update, plan_moves, validate_change, Change,
    LiveCollection, SubrangeMutation, SubrangeState,
};
use crate::binding::{apply_streamed, Streamed};
use crate::engine::Storage;
use crate::error::{fail_fast, BindingError};
use crate::lifetime::Lifetime;
use crate::types::Animation;

/// Outer mutation over sections; each element mutates one section's rows.
pub type SectionMutation<R, M = ()> = SubrangeMutation<SubrangeMutation<R, M>>;

/// Initial contents of a section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<R, M> {
    pub rows: Vec<R>,
    pub metadata: Option<M>,
}

impl<R, M> Section<R, M> {
    /// Contents described by a nested mutation.
    ///
    /// Only mutations that make sense against an empty section qualify:
    /// a reload, an insert at 0, or a metadata-only update.
    pub fn seed(mutation: SubrangeMutation<R, M>) -> Result<Self, BindingError> {
        let SubrangeMutation { change, metadata, .. } = mutation;
        match change {
            Change::Reload(rows) | Change::Insert { at: 0, elements: rows } => Ok(Section { rows, metadata }),
            Change::Update { at, elements } if at.is_empty() && elements.is_empty() => Ok(Section {
                rows: Vec::new(),
                metadata,
            }),
            other => Err(BindingError::InvalidNestedMutation {
                kind: other.kind_name(),
            }),
        }
    }
}

/// Committed shape of a sectioned binding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionedState {
    /// Position of the first owned section within the whole table.
    pub local_offset: usize,
    /// Row state per owned section.
    pub sections: Vec<SubrangeState>,
}

impl SectionedState {
    pub fn new(local_offset: usize) -> Self {
        Self {
            local_offset,
            sections: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Committed row count of a local section.
    pub fn row_count(&self, section: usize) -> Option<usize> {
        self.sections.get(section).map(|rows| rows.len)
    }

    fn global(&self, range: Range<usize>) -> Range<usize> {
        range.start + self.local_offset..range.end + self.local_offset
    }
}

/// Platform handle for a sectioned collection.
///
/// Section indices are in table coordinates (already offset).
pub trait LiveSections<R, M = ()> {
    /// Row handle of one section.
    type Rows<'a>: LiveCollection<R, M>
    where
        Self: 'a;

    fn insert_sections(&mut self, range: Range<usize>, sections: Vec<Section<R, M>>, animation: Animation);

    fn remove_sections(&mut self, range: Range<usize>, animation: Animation);

    /// Remove the section at `from`, then insert it at `to` in the result.
    fn move_section(&mut self, from: usize, to: usize);

    /// Replace the sections in `range` (counts may differ).
    fn reload_sections(&mut self, range: Range<usize>, sections: Vec<Section<R, M>>, animation: Animation);

    fn refresh_sections(&mut self, range: Range<usize>, animation: Animation);

    /// Replace a section's metadata without touching its rows.
    fn reload_section_metadata(&mut self, section: usize, metadata: M, animation: Animation);

    fn rows(&mut self, section: usize) -> Self::Rows<'_>;
}

fn seed_all<R, M>(elements: Vec<SubrangeMutation<R, M>>) -> Result<Vec<Section<R, M>>, BindingError> {
    elements.into_iter().map(Section::seed).collect()
}

fn row_states<R, M>(sections: &[Section<R, M>]) -> impl Iterator<Item = SubrangeState> + '_ {
    sections.iter().map(|section| SubrangeState::new(0, section.rows.len()))
}

/// Apply an outer mutation to `state`, issuing calls on `live`.
///
/// The outer mutation and every nested row mutation are validated before
/// any call is issued; on error neither `state` nor `live` has been touched.
pub fn apply_section_mutation<R, M, L>(
    mutation: SectionMutation<R, M>,
    state: &mut SectionedState,
    live: &mut L,
) -> Result<(), BindingError>
where
    L: LiveSections<R, M> + ?Sized,
{
    let animation = mutation.resolved_animation();
    let explicit = mutation.animation;
    let len = state.len();
    tracing::trace!(change = mutation.change.kind_name(), offset = state.local_offset, sections = len, "section mutation");

    match mutation.change {
        Change::Insert { at, elements } => {
            check_insert(at, len)?;
            let sections = seed_all(elements)?;
            if !sections.is_empty() {
                let count = sections.len();
                let states: Vec<SubrangeState> = row_states(&sections).collect();
                state.sections.splice(at..at, states);
                live.insert_sections(state.global(at..at + count), sections, animation);
            }
        }
        Change::Remove { at } => {
            check_indices(&at, len)?;
            for range in at.ranges().into_iter().rev() {
                state.sections.drain(range.clone());
                live.remove_sections(state.global(range), animation);
            }
        }
        Change::Move { from, to } => {
            check_move(&from, to, len)?;
            for (source, destination) in plan_moves(&from, to, len) {
                let section = state.sections.remove(source);
                state.sections.insert(destination, section);
                live.move_section(source + state.local_offset, destination + state.local_offset);
            }
        }
        Change::Update { at, elements } => {
            check_update(&at, &elements, len)?;
            for (index, nested) in at.iter().zip(&elements) {
                if !nested.is_metadata_only() {
                    validate_change(&nested.change, state.sections[index].len)?;
                }
            }
            for (index, mut nested) in at.iter().zip(elements) {
                let section = index + state.local_offset;
                if nested.animation.is_none() {
                    nested.animation = explicit;
                }
                if nested.is_metadata_only() {
                    let nested_animation = nested.resolved_animation();
                    if let Some(metadata) = nested.metadata {
                        live.reload_section_metadata(section, metadata, nested_animation);
                    }
                } else {
                    let mut rows = live.rows(section);
                    apply_mutation(nested, &mut state.sections[index], &mut rows)?;
                }
            }
        }
        Change::Reload(elements) => {
            let sections = seed_all(elements)?;
            let old = state.global(0..len);
            state.sections = row_states(&sections).collect();
            if !old.is_empty() || !sections.is_empty() {
                live.reload_sections(old, sections, animation);
            }
        }
        Change::Scroll => {
            if len > 0 {
                live.refresh_sections(state.global(0..len), animation);
            }
        }
    }
    Ok(())
}

/// [`apply_section_mutation`] against the state cached under `key`.
pub fn apply_sections<R, M, L>(
    storage: &Storage,
    key: &'static str,
    mutation: SectionMutation<R, M>,
    live: &mut L,
) -> Result<(), BindingError>
where
    L: LiveSections<R, M> + ?Sized,
{
    storage.with_cached::<SectionedState, _>(key, |state| apply_section_mutation(mutation, state, live))
}

/// Bind a streamed sectioned collection.
pub fn apply_sections_binding<I, R, M, L>(
    binding: &Streamed<SectionMutation<R, M>>,
    instance: &I,
    storage: &Rc<Storage>,
    key: &'static str,
    live: impl Fn(&I) -> L + 'static,
) -> Option<Lifetime>
where
    I: Clone + 'static,
    R: Clone + PartialEq + 'static,
    M: Clone + PartialEq + 'static,
    L: LiveSections<R, M>,
{
    let storage = Rc::downgrade(storage);
    apply_streamed(binding, instance, move |instance, mutation| {
        let Some(storage) = storage.upgrade() else {
            return;
        };
        let mut handle = live(instance);
        if let Err(err) = apply_sections(&storage, key, mutation, &mut handle) {
            fail_fast(err);
        }
    })
}
