//! Attribute and event namespace
//!
//! zzload keeps all of its state in element attributes. Every attribute and
//! every event name lives under a prefix so it cannot collide with host markup:
//! - Lifecycle flags: `is-observed`, `is-processed`, `is-loaded`, `is-failed`, `is-in-view`
//! - Declarative sources: `source-img`, `source-srcset`, `source-background-img`,
//!   `source-image`, `source-iframe`
//! - Markers: `source-container`, `source-inview`

use crate::{Element, NotificationKind};

/// Default prefix for attribute names
pub const DEFAULT_ATTRIBUTE_PREFIX: &str = "data-zzload-";

/// Default prefix for event names
pub const DEFAULT_EVENT_PREFIX: &str = "zzload:";

/// Attribute key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttrKey {
    IsObserved = 0,
    IsProcessed = 1,
    IsLoaded = 2,
    IsFailed = 3,
    IsInView = 4,
    SourceImg = 5,
    SourceSrcSet = 6,
    SourceBackgroundImg = 7,
    SourceImage = 8,
    SourceIframe = 9,
    SourceContainer = 10,
    SourceInView = 11,
}

impl AttrKey {
    pub const ALL: [AttrKey; 12] = [
        AttrKey::IsObserved,
        AttrKey::IsProcessed,
        AttrKey::IsLoaded,
        AttrKey::IsFailed,
        AttrKey::IsInView,
        AttrKey::SourceImg,
        AttrKey::SourceSrcSet,
        AttrKey::SourceBackgroundImg,
        AttrKey::SourceImage,
        AttrKey::SourceIframe,
        AttrKey::SourceContainer,
        AttrKey::SourceInView,
    ];

    /// Declarative source attributes removed after a successful load.
    /// `source-inview` is deliberately absent: it selects a mode, not a source.
    pub const DECLARATIVE_SOURCES: [AttrKey; 6] = [
        AttrKey::SourceImg,
        AttrKey::SourceSrcSet,
        AttrKey::SourceBackgroundImg,
        AttrKey::SourceImage,
        AttrKey::SourceIframe,
        AttrKey::SourceContainer,
    ];

    /// Attribute name without prefix
    pub fn suffix(self) -> &'static str {
        match self {
            AttrKey::IsObserved => "is-observed",
            AttrKey::IsProcessed => "is-processed",
            AttrKey::IsLoaded => "is-loaded",
            AttrKey::IsFailed => "is-failed",
            AttrKey::IsInView => "is-in-view",
            AttrKey::SourceImg => "source-img",
            AttrKey::SourceSrcSet => "source-srcset",
            AttrKey::SourceBackgroundImg => "source-background-img",
            AttrKey::SourceImage => "source-image",
            AttrKey::SourceIframe => "source-iframe",
            AttrKey::SourceContainer => "source-container",
            AttrKey::SourceInView => "source-inview",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        AttrKey::ALL.into_iter().find(|k| k.suffix() == suffix)
    }

    /// Markers count on presence alone, their value is ignored
    pub fn is_marker(self) -> bool {
        matches!(self, AttrKey::SourceContainer | AttrKey::SourceInView)
    }

    /// Lifecycle flag attribute (as opposed to a declaration)
    pub fn is_flag(self) -> bool {
        (self as u8) <= AttrKey::IsInView as u8
    }
}

/// Resolved attribute and event names
///
/// Built once and shared read-only by the tracker, dispatcher and monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    attribute_prefix: String,
    event_prefix: String,
    attributes: Vec<String>,
    events: Vec<String>,
}

impl Default for Namespace {
    fn default() -> Self {
        Namespace::new(DEFAULT_ATTRIBUTE_PREFIX, DEFAULT_EVENT_PREFIX)
    }
}

impl Namespace {
    pub fn new(attribute_prefix: &str, event_prefix: &str) -> Self {
        let attributes = AttrKey::ALL
            .iter()
            .map(|k| format!("{attribute_prefix}{}", k.suffix()))
            .collect();
        let events = NotificationKind::ALL
            .iter()
            .map(|k| format!("{event_prefix}{}", k.suffix()))
            .collect();

        Namespace {
            attribute_prefix: attribute_prefix.to_owned(),
            event_prefix: event_prefix.to_owned(),
            attributes,
            events,
        }
    }

    pub fn attribute_prefix(&self) -> &str {
        &self.attribute_prefix
    }

    pub fn event_prefix(&self) -> &str {
        &self.event_prefix
    }

    /// Full attribute name for a key
    #[inline]
    pub fn attr(&self, key: AttrKey) -> &str {
        &self.attributes[key as usize]
    }

    /// Full event name for a notification kind
    #[inline]
    pub fn event(&self, kind: NotificationKind) -> &str {
        &self.events[kind as usize]
    }

    /// Map a full event name back to its kind
    pub fn kind_of(&self, event_name: &str) -> Option<NotificationKind> {
        event_name
            .strip_prefix(self.event_prefix.as_str())
            .and_then(NotificationKind::from_suffix)
    }

    /// Read a declaration. URL-bearing keys treat an empty value as absent;
    /// markers report `Some("")` on presence.
    pub fn declared<E: Element>(&self, element: &E, key: AttrKey) -> Option<String> {
        let value = element.attribute(self.attr(key))?;
        if key.is_marker() || !value.is_empty() {
            Some(value)
        } else {
            None
        }
    }

    /// Marker presence (`source-container`, `source-inview`)
    pub fn has_marker<E: Element>(&self, element: &E, key: AttrKey) -> bool {
        element.has_attribute(self.attr(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let ns = Namespace::default();
        assert_eq!(ns.attr(AttrKey::IsObserved), "data-zzload-is-observed");
        assert_eq!(ns.attr(AttrKey::SourceBackgroundImg), "data-zzload-source-background-img");
        assert_eq!(ns.attr(AttrKey::SourceInView), "data-zzload-source-inview");
        assert_eq!(ns.event(NotificationKind::OutOfView), "zzload:outOfView");
    }

    #[test]
    fn test_custom_prefix() {
        let ns = Namespace::new("data-lazy-", "lazy:");
        assert_eq!(ns.attr(AttrKey::IsLoaded), "data-lazy-is-loaded");
        assert_eq!(ns.kind_of("lazy:inView"), Some(NotificationKind::InView));
        assert_eq!(ns.kind_of("zzload:inView"), None);
    }

    #[test]
    fn test_key_partitions() {
        let flags = AttrKey::ALL.iter().filter(|k| k.is_flag()).count();
        assert_eq!(flags, 5);
        assert!(!AttrKey::DECLARATIVE_SOURCES.contains(&AttrKey::SourceInView));
        assert!(AttrKey::DECLARATIVE_SOURCES.iter().all(|k| !k.is_flag()));
        assert_eq!(AttrKey::from_suffix("source-iframe"), Some(AttrKey::SourceIframe));
    }
}
