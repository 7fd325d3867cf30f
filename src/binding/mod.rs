//! Bindings - declarative, timing-tagged configuration.
//!
//! An adapter describes an instance as an ordered list of bindings. Each
//! binding wraps its payload in one of five timing primitives:
//!
//! - [`Constructed`] - fixed at construction, immutable afterwards
//! - [`Dynamic`] - initial value plus subsequent updates
//! - [`Streamed`] - updates only, after construction
//! - [`Output`] - the instance pushes values out on interaction
//! - [`Synchronous`] - callback run inside a delegate method's call stack
//!
//! plus an `Inherited(ParentBinding)` case per adapter for composition.
//!
//! # Example
//!
//! ```ignore
//! enum TextFieldBinding {
//!     Inherited(ControlBinding),
//!     BorderStyle(Constructed<BorderStyle>),
//!     Text(Dynamic<String>),
//!     TextChanged(Output<String>),
//!     ShouldReturn(Synchronous<(), bool>),
//! }
//!
//! let bound = Binder::<TextFieldPreparer>::new(vec![
//!     TextFieldBinding::BorderStyle(Constructed(BorderStyle::Rounded)),
//!     TextFieldBinding::Text(title_signal.into()),
//!     TextFieldBinding::ShouldReturn(Synchronous::new(|()| true)),
//! ])
//! .construct(());
//! ```
//!
//! The [`Binder`] walks the list twice: a prepare pass that collects
//! construction-time configuration, then (after construction) an apply pass
//! that returns one aggregated [`Lifetime`](crate::Lifetime).

mod apply;
mod binder;
mod stream;
mod types;

pub use apply::*;
pub use binder::*;
pub use stream::*;
pub use types::*;
