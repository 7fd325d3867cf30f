//! Core types shared across the runtime.
//!
//! - [`InstanceId`] - generational identity of an instance (side-table key)
//! - [`ControlState`] / [`BarMetrics`] / [`ControlScope`] - compound scope keys
//! - [`Animation`] - animation token for collection mutations

use std::fmt;

// =============================================================================
// Instance Identity
// =============================================================================

/// Identity of an instance, unique for the life of the thread.
///
/// Allocated by [`allocate_instance`](crate::engine::allocate_instance) and
/// used as the key of every per-instance side table (storage, destroy hooks).
/// Registry slots are recycled, but each reuse bumps the slot's generation,
/// so an id held past its instance's release never names a newer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    index: usize,
    generation: u32,
}

impl InstanceId {
    pub const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Registry slot.
    pub fn index(self) -> usize {
        self.index
    }

    /// Number of times the slot was released before this id was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "#{}.{}", self.index, self.generation)
        }
    }
}

// =============================================================================
// Control State (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Interaction state of a control, used as part of a scope key.
    ///
    /// `NORMAL` is the empty set. Combine with bitwise OR:
    /// `ControlState::HIGHLIGHTED | ControlState::SELECTED`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ControlState: u8 {
        const NORMAL = 0;
        const HIGHLIGHTED = 1 << 0;
        const DISABLED = 1 << 1;
        const SELECTED = 1 << 2;
        const FOCUSED = 1 << 3;
    }
}

// =============================================================================
// Bar Metrics
// =============================================================================

/// Layout metrics a value can be scoped to (bar buttons, backgrounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BarMetrics {
    #[default]
    Default,
    Compact,
    DefaultPrompt,
    CompactPrompt,
}

// =============================================================================
// Control Scope
// =============================================================================

/// Compound scope key: control state × bar metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ControlScope {
    pub state: ControlState,
    pub metrics: BarMetrics,
}

impl ControlScope {
    pub const NORMAL: ControlScope = ControlScope {
        state: ControlState::NORMAL,
        metrics: BarMetrics::Default,
    };

    pub fn new(state: ControlState, metrics: BarMetrics) -> Self {
        Self { state, metrics }
    }

    /// Scope for a state at default metrics.
    pub fn state(state: ControlState) -> Self {
        Self { state, metrics: BarMetrics::Default }
    }
}

impl From<ControlState> for ControlScope {
    fn from(state: ControlState) -> Self {
        ControlScope::state(state)
    }
}

// =============================================================================
// Animation
// =============================================================================

/// Animation token attached to a collection mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Animation {
    /// No animation.
    None,
    /// Platform picks the animation.
    #[default]
    Automatic,
    Fade,
    Top,
    Bottom,
    Left,
    Right,
    Middle,
}

impl Animation {
    pub fn is_animated(self) -> bool {
        self != Animation::None
    }
}
