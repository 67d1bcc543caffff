//! Records notifications and callbacks in arrival order

use std::sync::Arc;

use parking_lot::Mutex;
use zzload_core::{MemoryElement, Namespace, Notification, NotificationKind, Options, Publisher};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Notified {
        kind: NotificationKind,
        element: MemoryElement,
        source: Option<String>,
    },
    ProcessStarted(MemoryElement),
    LoadCallback(MemoryElement, Option<String>),
    ErrorCallback(MemoryElement, String),
}

impl Record {
    pub fn element(&self) -> &MemoryElement {
        match self {
            Record::Notified { element, .. }
            | Record::ProcessStarted(element)
            | Record::LoadCallback(element, _)
            | Record::ErrorCallback(element, _) => element,
        }
    }
}

/// Shared log; clones append to the same list
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<Record>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install recording callbacks on `options`
    pub fn attach(&self, options: Options<MemoryElement>) -> Options<MemoryElement> {
        let (a, b, c) = (self.clone(), self.clone(), self.clone());
        options
            .on_process_start(move |el| a.push(Record::ProcessStarted(el.clone())))
            .on_load(move |el, src| b.push(Record::LoadCallback(el.clone(), src.map(str::to_owned))))
            .on_error(move |el, src| c.push(Record::ErrorCallback(el.clone(), src.to_owned())))
    }

    /// Record events bubbling to `root` whose name lives in `namespace`
    pub fn listen(&self, root: &MemoryElement, namespace: &Namespace) {
        let recorder = self.clone();
        let namespace = namespace.clone();
        root.add_wildcard_listener(move |name, n| {
            if namespace.kind_of(name) == Some(n.kind) {
                recorder.record(n);
            }
        });
    }

    pub fn records(&self) -> Vec<Record> {
        self.log.lock().clone()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }

    /// Notification kinds seen for one element, in order
    pub fn kinds(&self, element: &MemoryElement) -> Vec<NotificationKind> {
        self.log
            .lock()
            .iter()
            .filter_map(|r| match r {
                Record::Notified { kind, element: e, .. } if e == element => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Payload of the last notification of `kind` for `element`
    pub fn source_of(&self, kind: NotificationKind, element: &MemoryElement) -> Option<Option<String>> {
        self.log.lock().iter().rev().find_map(|r| match r {
            Record::Notified {
                kind: k,
                element: e,
                source,
            } if *k == kind && e == element => Some(source.clone()),
            _ => None,
        })
    }

    pub fn loads(&self) -> Vec<(MemoryElement, Option<String>)> {
        self.log
            .lock()
            .iter()
            .filter_map(|r| match r {
                Record::LoadCallback(e, s) => Some((e.clone(), s.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(MemoryElement, String)> {
        self.log
            .lock()
            .iter()
            .filter_map(|r| match r {
                Record::ErrorCallback(e, s) => Some((e.clone(), s.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn process_starts(&self) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|r| matches!(r, Record::ProcessStarted(_)))
            .count()
    }

    fn record(&self, n: &Notification<MemoryElement>) {
        self.push(Record::Notified {
            kind: n.kind,
            element: n.element.clone(),
            source: n.source.clone(),
        });
    }

    fn push(&self, record: Record) {
        self.log.lock().push(record);
    }
}

impl Publisher<MemoryElement> for Recorder {
    fn publish(&self, notification: &Notification<MemoryElement>) {
        self.record(notification);
    }
}
