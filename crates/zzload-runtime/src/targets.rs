//! Target selection

use zzload_core::Element;

/// Selector used when none is given
pub const DEFAULT_SELECTOR: &str = ".zzload";

/// Element lookup side of the host environment
pub trait Document<E: Element> {
    /// Matching elements in document order
    fn query_selector_all(&self, selectors: &str) -> Vec<E>;
}

/// What `observe()` watches
#[derive(Clone, Debug, PartialEq)]
pub enum Targets<E> {
    /// Re-queried on every `observe()`, so markup added later is picked up
    Selector(String),
    Element(E),
    Collection(Vec<E>),
}

impl<E> Default for Targets<E> {
    fn default() -> Self {
        Targets::Selector(DEFAULT_SELECTOR.into())
    }
}

impl<E: Element> Targets<E> {
    pub fn selector(selectors: impl Into<String>) -> Self {
        Targets::Selector(selectors.into())
    }

    pub fn resolve(&self, document: &dyn Document<E>) -> Vec<E> {
        match self {
            Targets::Selector(selectors) => document.query_selector_all(selectors),
            Targets::Element(element) => vec![element.clone()],
            Targets::Collection(elements) => elements.clone(),
        }
    }
}

impl<E> From<&str> for Targets<E> {
    fn from(selectors: &str) -> Self {
        Targets::Selector(selectors.to_owned())
    }
}

impl<E> From<Vec<E>> for Targets<E> {
    fn from(elements: Vec<E>) -> Self {
        Targets::Collection(elements)
    }
}
