//! zzload Dispatch - Source resolution and the element lifecycle
//!
//! This crate implements the Source Dispatcher:
//! - Strategy classification over declarative attributes
//! - Probe image and in-place (iframe) loads through the host seam
//! - Picture candidate resolution
//! - Settlement of one outcome into flags, notifications, callbacks
//!   and the optional awaitable result

pub mod host;
pub mod url;
pub mod classify;
pub mod outcome;
pub mod picture;
pub mod dispatcher;

pub use host::*;
pub use url::*;
pub use classify::*;
pub use outcome::*;
pub use picture::*;
pub use dispatcher::*;
