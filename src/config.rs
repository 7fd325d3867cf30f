//! Runtime configuration.
//!
//! The runtime is confined to the UI thread, so configuration lives in a
//! thread-local like every other piece of runtime state.
//!
//! ```ignore
//! use spark_bind::config::{set_config, RuntimeConfig};
//! use spark_bind::Animation;
//!
//! set_config(RuntimeConfig {
//!     default_animation: Animation::Fade,
//!     ..Default::default()
//! });
//! ```

use std::cell::RefCell;

use crate::types::Animation;

/// Tunables read by the differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Animation used when a structural mutation carries none.
    pub default_animation: Animation,
    /// Animate `reload` mutations that carry no explicit animation.
    pub animate_reloads: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_animation: Animation::Automatic,
            animate_reloads: false,
        }
    }
}

thread_local! {
    static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::default());
}

/// Current configuration.
pub fn config() -> RuntimeConfig {
    CONFIG.with(|c| *c.borrow())
}

/// Replace the configuration.
pub fn set_config(config: RuntimeConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// Restore defaults (for testing).
pub fn reset_config() {
    set_config(RuntimeConfig::default());
}
