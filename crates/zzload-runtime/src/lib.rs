//! zzload Runtime - Public entry point
//!
//! Wires one namespace, tracker, dispatcher and monitor together behind
//! `observe()` and `trigger_load()`.

pub mod targets;
pub mod loader;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use targets::*;
pub use loader::*;
#[cfg(feature = "telemetry")]
pub use telemetry::*;

pub use zzload_core::{Element, LoaderConfig, Options};
pub use zzload_dispatch::{LoadResult, PendingLoad};
pub use zzload_monitor::WatchReport;
