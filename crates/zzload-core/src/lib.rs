//! zzload Core - Fundamental types and seams
//!
//! This crate defines the pieces shared by every other zzload crate:
//! - The `Element` abstraction the core annotates
//! - Attribute and event namespace
//! - Notifications and the publisher seam
//! - Lifecycle flags (the State Tracker)
//! - Loader configuration, options and callbacks
//! - Error taxonomy

pub mod element;
pub mod namespace;
pub mod event;
pub mod tracker;
pub mod config;
pub mod options;
pub mod error;
#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use element::*;
pub use namespace::*;
pub use event::*;
pub use tracker::*;
pub use config::*;
pub use options::*;
pub use error::*;
#[cfg(any(test, feature = "memory"))]
pub use memory::*;
