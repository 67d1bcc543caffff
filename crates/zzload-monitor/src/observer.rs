//! Viewport-intersection seam

use std::rc::Rc;

use zzload_core::{ConfigResult, Element, ObserverSettings};

/// One intersection change reported by the host
#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionEntry<E> {
    pub target: E,
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
}

impl<E> IntersectionEntry<E> {
    pub fn new(target: E, intersection_ratio: f64, is_intersecting: bool) -> Self {
        IntersectionEntry {
            target,
            intersection_ratio,
            is_intersecting,
        }
    }

    /// Entered the observation region. Either signal counts; hosts disagree
    /// on which one they populate for zero-area targets.
    pub fn is_visible(&self) -> bool {
        self.intersection_ratio > 0.0 || self.is_intersecting
    }
}

/// Live intersection observer
pub trait IntersectionObserver<E> {
    fn observe(&self, element: &E);

    fn unobserve(&self, element: &E);

    /// Stop observing everything
    fn disconnect(&self) {}
}

/// Receives each batch of entries together with the observer that produced
/// them, so handlers can unobserve.
pub type IntersectionCallback<E> = Rc<dyn Fn(&[IntersectionEntry<E>], &dyn IntersectionObserver<E>)>;

/// Viewport side of the host environment
pub trait ViewportHost<E: Element> {
    /// Create an observer, or `Ok(None)` if the environment has no
    /// intersection primitive. Settings the primitive refuses are a
    /// configuration error.
    fn create_observer(
        &self,
        settings: &ObserverSettings,
        callback: IntersectionCallback<E>,
    ) -> ConfigResult<Option<Box<dyn IntersectionObserver<E>>>>;
}
