//! Resource host seam
//!
//! The dispatcher never performs network work itself. It asks the host to
//! fetch through a detached probe image, or to let an element (an iframe)
//! load its own source, and waits for a single-shot completion.

use zzload_core::Element;

/// What a probe image should fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeRequest {
    pub src: String,
    pub srcset: Option<String>,
}

impl ProbeRequest {
    pub fn new(src: impl Into<String>) -> Self {
        ProbeRequest {
            src: src.into(),
            srcset: None,
        }
    }

    pub fn with_srcset(mut self, srcset: Option<String>) -> Self {
        self.srcset = srcset;
        self
    }
}

/// How a probe or in-place load ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// `current_src` is the candidate actually fetched, after srcset and
    /// pixel-density negotiation
    Loaded { current_src: String },
    /// `src` is the source that was attempted
    Failed { src: String },
}

impl ProbeOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ProbeOutcome::Loaded { .. })
    }
}

/// Single-shot completion. Hosts call it at most once, possibly before
/// `probe` / `load_in_place` has returned.
pub type Completion = Box<dyn FnOnce(ProbeOutcome)>;

/// Network side of the host environment
pub trait ResourceHost<E: Element> {
    /// Origin of the page (`scheme://host[:port]`), used to normalize
    /// rendered candidates
    fn origin(&self) -> Option<String>;

    /// Fetch through a detached, never-rendered image
    fn probe(&self, request: ProbeRequest, done: Completion);

    /// Set `src` on an element that is itself the network client and report
    /// its own load/error
    fn load_in_place(&self, element: &E, src: &str, done: Completion);
}
