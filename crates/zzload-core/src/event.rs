//! Notification definitions
//!
//! Every lifecycle transition is announced as a notification carrying the
//! element and, where one exists, the source involved. Delivery goes through
//! the `Publisher` seam; `ElementEvents` is the default binding that
//! dispatches on the element itself so notifications bubble like DOM events.

use std::rc::Rc;

use crate::{Element, Namespace};

/// Notification classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NotificationKind {
    Observed = 0,
    Processed = 1,
    Loaded = 2,
    Failed = 3,
    InView = 4,
    OutOfView = 5,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 6] = [
        NotificationKind::Observed,
        NotificationKind::Processed,
        NotificationKind::Loaded,
        NotificationKind::Failed,
        NotificationKind::InView,
        NotificationKind::OutOfView,
    ];

    /// Event name without prefix
    pub fn suffix(self) -> &'static str {
        match self {
            NotificationKind::Observed => "observed",
            NotificationKind::Processed => "processed",
            NotificationKind::Loaded => "loaded",
            NotificationKind::Failed => "failed",
            NotificationKind::InView => "inView",
            NotificationKind::OutOfView => "outOfView",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        NotificationKind::ALL.into_iter().find(|k| k.suffix() == suffix)
    }

    /// Terminal outcome of a dispatch?
    pub fn is_terminal(self) -> bool {
        matches!(self, NotificationKind::Loaded | NotificationKind::Failed)
    }
}

/// A lifecycle notification
#[derive(Clone, Debug)]
pub struct Notification<E> {
    pub kind: NotificationKind,
    pub element: E,
    /// Resolved source on `Loaded`, attempted source on `Failed`
    pub source: Option<String>,
}

impl<E> Notification<E> {
    pub fn new(kind: NotificationKind, element: E) -> Self {
        Notification {
            kind,
            element,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }
}

/// Receives lifecycle notifications
pub trait Publisher<E> {
    fn publish(&self, notification: &Notification<E>);
}

impl<E, F> Publisher<E> for F
where
    F: Fn(&Notification<E>),
{
    fn publish(&self, notification: &Notification<E>) {
        self(notification)
    }
}

/// Publishes by dispatching the namespaced event on the element itself
#[derive(Clone, Debug)]
pub struct ElementEvents {
    namespace: Namespace,
}

impl ElementEvents {
    pub fn new(namespace: Namespace) -> Self {
        ElementEvents { namespace }
    }
}

impl<E: Element> Publisher<E> for ElementEvents {
    fn publish(&self, notification: &Notification<E>) {
        let name = self.namespace.event(notification.kind);
        notification.element.dispatch(name, notification);
    }
}

/// Fans one notification out to several publishers, in registration order
pub struct Broadcast<E> {
    targets: Vec<Rc<dyn Publisher<E>>>,
}

impl<E> Default for Broadcast<E> {
    fn default() -> Self {
        Broadcast {
            targets: Vec::new(),
        }
    }
}

impl<E> Broadcast<E> {
    pub fn new() -> Self {
        Broadcast::default()
    }

    pub fn with(mut self, target: Rc<dyn Publisher<E>>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl<E> Publisher<E> for Broadcast<E> {
    fn publish(&self, notification: &Notification<E>) {
        for target in &self.targets {
            target.publish(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_kind_roundtrip() {
        for kind in NotificationKind::ALL {
            assert_eq!(NotificationKind::from_suffix(kind.suffix()), Some(kind));
        }
        assert_eq!(NotificationKind::from_suffix("loading"), None);
    }

    #[test]
    fn test_terminal_kinds() {
        let terminal: Vec<_> = NotificationKind::ALL
            .into_iter()
            .filter(|k| k.is_terminal())
            .collect();
        assert_eq!(terminal, vec![NotificationKind::Loaded, NotificationKind::Failed]);
    }

    #[test]
    fn test_broadcast_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let a = {
            let seen = seen.clone();
            Rc::new(move |n: &Notification<u32>| seen.borrow_mut().push(("a", n.element)))
        };
        let b = {
            let seen = seen.clone();
            Rc::new(move |n: &Notification<u32>| seen.borrow_mut().push(("b", n.element)))
        };
        let broadcast = Broadcast::<u32>::new().with(a).with(b);
        broadcast.publish(&Notification::new(NotificationKind::Loaded, 7));

        assert_eq!(broadcast.len(), 2);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }
}
