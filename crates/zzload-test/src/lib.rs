//! zzload Test Harness - Headless pages for lifecycle validation
//!
//! This crate provides:
//! - A simulated network that settles probes on demand
//! - A simulated viewport driven by layout geometry or scripted entries
//! - `MemoryPage`, an in-memory document implementing every host seam
//! - A recorder for notifications and callbacks
//! - End-to-end scenarios over the public entry

pub mod network;
pub mod viewport;
pub mod page;
pub mod recorder;
pub mod integration;

pub use network::*;
pub use viewport::*;
pub use page::*;
pub use recorder::*;
pub use integration::*;
