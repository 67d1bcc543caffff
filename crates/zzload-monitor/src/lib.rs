//! zzload Monitor - Deciding when an element is worth loading
//!
//! This crate implements the Visibility Monitor:
//! - The viewport-intersection seam (`ViewportHost`, `IntersectionObserver`)
//! - Registration with `observed` de-duplication
//! - Enter/leave handling, including in-view toggle mode
//! - Degraded mode when no intersection primitive exists
//! - Geometry helpers for hosts that compute intersections themselves

pub mod geometry;
pub mod observer;
pub mod monitor;

pub use geometry::*;
pub use observer::*;
pub use monitor::*;
