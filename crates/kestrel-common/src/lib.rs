//! # Kestrel Common
//!
//! Common types, errors, and utilities shared across all KestrelDB crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod testing;
pub mod types;

pub use config::*;
pub use error::{Error, Result};
pub use types::*;

/// Re-export commonly used external types
pub mod prelude {
    pub use super::error::{Error, Result};
    pub use super::types::*;
    pub use super::config::*;
    pub use tracing::{debug, error, info, trace, warn, instrument};
}
