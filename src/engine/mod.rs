//! Engine - instance identity and per-instance storage.
//!
//! The engine owns the only global mutable state of the runtime:
//! - Registry: identity allocation, labels, destroy hooks
//! - Storage: identity-keyed side table of [`Storage`] objects
//!
//! # Architecture
//!
//! Instances are external objects the runtime cannot extend. Each one is
//! given an [`InstanceId`](crate::InstanceId) at construction, and every
//! piece of runtime state about it lives in side tables keyed by that id:
//!
//! ```text
//! #0 TextField → Storage { delegates: [TextFieldMethod], cache: {"titles"}, retained: 2 }
//! #1 Table     → Storage { delegates: [TableMethod, DataSourceMethod], cache: {"sections"} }
//! ```
//!
//! Releasing the id runs destroy hooks and removes every entry exactly once.
//! Instances normally own a [`Registration`] that does this when the platform
//! object is dropped.

mod registry;
mod storage;

pub use registry::*;
pub use storage::{create_storage, storage, storage_count, Storage};
