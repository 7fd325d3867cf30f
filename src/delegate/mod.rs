//! Delegate multiplexing.
//!
//! Native delegate roles declare many optional callback methods, and the
//! platform changes behaviour depending on which ones the delegate
//! implements. A [`Multiplexer`] stands in for such a role: it holds a
//! registration table keyed by a method identifier enum and answers
//! [`responds_to`](Multiplexer::responds_to) purely from table membership.
//!
//! # Lifecycle (per instance and protocol)
//!
//! ```text
//! NoDelegateNeeded ──first Synchronous binding──▶ ClassSelected ──construct──▶ Installed
//! ```
//!
//! - `NoDelegateNeeded`: no multiplexer exists in the instance's storage.
//! - `ClassSelected`: prepare saw a binding that needs protocol `M`.
//! - `Installed`: the adapter assigned the multiplexer as the native delegate.

mod multiplexer;

pub use multiplexer::*;
