//! Lifecycle flags - the State Tracker
//!
//! Flags are stored as attributes on the element itself; there is no side
//! table. Absence of every flag is the virgin state. Marking is idempotent
//! and always re-publishes; de-duplication is the dispatcher's job.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::{AttrKey, Element, ElementEvents, Namespace, Notification, NotificationKind, Publisher};

/// Lifecycle flag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flag {
    Observed,
    Processed,
    Loaded,
    Failed,
    InView,
}

impl Flag {
    pub const ALL: [Flag; 5] = [
        Flag::Observed,
        Flag::Processed,
        Flag::Loaded,
        Flag::Failed,
        Flag::InView,
    ];

    /// Attribute carrying this flag
    pub fn attr_key(self) -> AttrKey {
        match self {
            Flag::Observed => AttrKey::IsObserved,
            Flag::Processed => AttrKey::IsProcessed,
            Flag::Loaded => AttrKey::IsLoaded,
            Flag::Failed => AttrKey::IsFailed,
            Flag::InView => AttrKey::IsInView,
        }
    }

    /// Notification published when the flag is set
    pub fn notification(self) -> NotificationKind {
        match self {
            Flag::Observed => NotificationKind::Observed,
            Flag::Processed => NotificationKind::Processed,
            Flag::Loaded => NotificationKind::Loaded,
            Flag::Failed => NotificationKind::Failed,
            Flag::InView => NotificationKind::InView,
        }
    }

    /// Only `InView` may be set and later cleared
    pub fn is_reversible(self) -> bool {
        matches!(self, Flag::InView)
    }
}

/// Point-in-time view of an element's flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlagSnapshot {
    pub observed: bool,
    pub processed: bool,
    pub loaded: bool,
    pub failed: bool,
    pub in_view: bool,
}

impl FlagSnapshot {
    /// No flag set
    pub fn is_virgin(&self) -> bool {
        *self == FlagSnapshot::default()
    }

    /// A terminal outcome was recorded
    pub fn is_settled(&self) -> bool {
        self.loaded || self.failed
    }
}

/// Reads and writes lifecycle flags, publishing a notification per write
#[derive(Clone)]
pub struct Tracker<E> {
    namespace: Rc<Namespace>,
    publisher: Rc<dyn Publisher<E>>,
}

impl<E> fmt::Debug for Tracker<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl<E: Element> Tracker<E> {
    /// Tracker that dispatches notifications on the elements themselves
    pub fn new(namespace: Rc<Namespace>) -> Self {
        let publisher = Rc::new(ElementEvents::new((*namespace).clone()));
        Tracker {
            namespace,
            publisher,
        }
    }

    /// Tracker with a custom publisher
    pub fn with_publisher(namespace: Rc<Namespace>, publisher: Rc<dyn Publisher<E>>) -> Self {
        Tracker {
            namespace,
            publisher,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Set a flag and publish its notification with an optional payload
    pub fn mark(&self, flag: Flag, element: &E, source: Option<&str>) {
        element.set_attribute(self.namespace.attr(flag.attr_key()), "");
        debug!(?flag, ?element, ?source, "flag set");
        self.publish(flag.notification(), element, source);
    }

    /// Clear a reversible flag. Only `InView` can be cleared; it publishes
    /// `OutOfView`. Returns false for irreversible flags.
    pub fn clear(&self, flag: Flag, element: &E) -> bool {
        if !flag.is_reversible() {
            return false;
        }
        element.remove_attribute(self.namespace.attr(flag.attr_key()));
        debug!(?flag, ?element, "flag cleared");
        self.publish(NotificationKind::OutOfView, element, None);
        true
    }

    /// Is the flag present?
    pub fn check(&self, flag: Flag, element: &E) -> bool {
        element.has_attribute(self.namespace.attr(flag.attr_key()))
    }

    pub fn snapshot(&self, element: &E) -> FlagSnapshot {
        FlagSnapshot {
            observed: self.check(Flag::Observed, element),
            processed: self.check(Flag::Processed, element),
            loaded: self.check(Flag::Loaded, element),
            failed: self.check(Flag::Failed, element),
            in_view: self.check(Flag::InView, element),
        }
    }

    /// Remove every declarative source attribute. Flags and the in-view
    /// marker are left alone. Safe to call repeatedly.
    pub fn strip_sources(&self, element: &E) {
        for key in AttrKey::DECLARATIVE_SOURCES {
            element.remove_attribute(self.namespace.attr(key));
        }
    }

    fn publish(&self, kind: NotificationKind, element: &E, source: Option<&str>) {
        let notification =
            Notification::new(kind, element.clone()).with_source(source.map(str::to_owned));
        self.publisher.publish(&notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Property;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// Minimal element: a shared attribute map
    #[derive(Clone, Debug, Default)]
    struct Attrs(Rc<RefCell<BTreeMap<String, String>>>);

    impl Element for Attrs {
        fn tag_name(&self) -> String {
            "div".into()
        }
        fn attribute(&self, name: &str) -> Option<String> {
            self.0.borrow().get(name).cloned()
        }
        fn set_attribute(&self, name: &str, value: &str) {
            self.0.borrow_mut().insert(name.into(), value.into());
        }
        fn remove_attribute(&self, name: &str) {
            self.0.borrow_mut().remove(name);
        }
        fn children(&self) -> Vec<Self> {
            Vec::new()
        }
        fn first_descendant(&self, _tag: &str) -> Option<Self> {
            None
        }
        fn property(&self, _property: Property) -> Option<String> {
            None
        }
        fn set_property(&self, _property: Property, _value: &str) {}
        fn current_src(&self) -> Option<String> {
            None
        }
        fn dispatch(&self, _event_name: &str, _notification: &Notification<Self>) {}
    }

    fn recording_tracker() -> (Tracker<Attrs>, Rc<RefCell<Vec<(NotificationKind, Option<String>)>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let publisher = Rc::new(move |n: &Notification<Attrs>| {
            sink.borrow_mut().push((n.kind, n.source.clone()));
        });
        let tracker = Tracker::with_publisher(Rc::new(Namespace::default()), publisher);
        (tracker, log)
    }

    #[test]
    fn test_mark_and_check() {
        let (tracker, log) = recording_tracker();
        let el = Attrs::default();

        assert!(tracker.snapshot(&el).is_virgin());
        tracker.mark(Flag::Loaded, &el, Some("a.png"));

        assert!(tracker.check(Flag::Loaded, &el));
        assert!(el.has_attribute("data-zzload-is-loaded"));
        assert!(tracker.snapshot(&el).is_settled());
        assert_eq!(
            *log.borrow(),
            vec![(NotificationKind::Loaded, Some("a.png".to_string()))]
        );
    }

    #[test]
    fn test_mark_twice_republishes() {
        let (tracker, log) = recording_tracker();
        let el = Attrs::default();

        tracker.mark(Flag::Observed, &el, None);
        tracker.mark(Flag::Observed, &el, None);

        assert!(tracker.check(Flag::Observed, &el));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_clear_only_in_view() {
        let (tracker, log) = recording_tracker();
        let el = Attrs::default();

        tracker.mark(Flag::Processed, &el, None);
        assert!(!tracker.clear(Flag::Processed, &el));
        assert!(tracker.check(Flag::Processed, &el));

        tracker.mark(Flag::InView, &el, None);
        assert!(tracker.clear(Flag::InView, &el));
        assert!(!tracker.check(Flag::InView, &el));

        let kinds: Vec<_> = log.borrow().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::Processed,
                NotificationKind::InView,
                NotificationKind::OutOfView
            ]
        );
    }

    #[test]
    fn test_strip_sources_keeps_flags() {
        let (tracker, _) = recording_tracker();
        let ns = Namespace::default();
        let el = Attrs::default();

        for key in AttrKey::ALL {
            el.set_attribute(ns.attr(key), "x");
        }
        tracker.strip_sources(&el);
        tracker.strip_sources(&el);

        for key in AttrKey::ALL {
            let present = el.has_attribute(ns.attr(key));
            let expect = !AttrKey::DECLARATIVE_SOURCES.contains(&key);
            assert_eq!(present, expect, "{key:?}");
        }
    }
}
