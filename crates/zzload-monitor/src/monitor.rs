//! Visibility monitor
//!
//! Registers elements with the host's intersection observer and forwards
//! the first entry into view to the load handler. Elements carrying the
//! in-view marker are never loaded; their `in-view` flag follows the
//! viewport instead and they stay observed.

use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, trace};
use zzload_core::{AttrKey, ConfigResult, Element, Flag, ObserverSettings, Tracker};

use crate::{IntersectionCallback, IntersectionEntry, IntersectionObserver, ViewportHost};

/// Invoked once per element when it enters view (or at watch time in
/// degraded mode)
pub type IntersectFn<E> = Rc<dyn Fn(&E)>;

/// What one `watch` call did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WatchReport {
    /// Newly handed to the observer
    pub registered: usize,
    /// Already carried `observed`
    pub skipped: usize,
    /// Loaded synchronously because no observer exists
    pub dispatched_immediately: usize,
}

impl WatchReport {
    pub fn total(&self) -> usize {
        self.registered + self.skipped + self.dispatched_immediately
    }
}

pub struct VisibilityMonitor<E: Element> {
    tracker: Tracker<E>,
    observer: Option<Box<dyn IntersectionObserver<E>>>,
    on_intersect: IntersectFn<E>,
}

impl<E: Element> fmt::Debug for VisibilityMonitor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityMonitor")
            .field("degraded", &self.is_degraded())
            .finish()
    }
}

impl<E: Element> VisibilityMonitor<E> {
    /// Create the monitor and its observer. A host without an intersection
    /// primitive yields a degraded monitor.
    pub fn new(
        tracker: Tracker<E>,
        host: &dyn ViewportHost<E>,
        settings: &ObserverSettings,
        on_intersect: IntersectFn<E>,
    ) -> ConfigResult<Self> {
        let callback: IntersectionCallback<E> = {
            let tracker = tracker.clone();
            let on_intersect = on_intersect.clone();
            Rc::new(move |entries: &[IntersectionEntry<E>], observer: &dyn IntersectionObserver<E>| {
                handle_entries(&tracker, &on_intersect, entries, observer)
            })
        };

        let observer = host.create_observer(settings, callback)?;
        if observer.is_none() {
            info!("no intersection observer available; loading on watch");
        }

        Ok(VisibilityMonitor {
            tracker,
            observer,
            on_intersect,
        })
    }

    pub fn is_degraded(&self) -> bool {
        self.observer.is_none()
    }

    /// Register every element not yet observed
    pub fn watch<I>(&self, elements: I) -> WatchReport
    where
        I: IntoIterator<Item = E>,
    {
        let mut report = WatchReport::default();
        for element in elements {
            if self.tracker.check(Flag::Observed, &element) {
                trace!(?element, "already observed");
                report.skipped += 1;
                continue;
            }
            self.tracker.mark(Flag::Observed, &element, None);

            match &self.observer {
                Some(observer) => {
                    observer.observe(&element);
                    report.registered += 1;
                }
                None => {
                    (self.on_intersect)(&element);
                    report.dispatched_immediately += 1;
                }
            }
        }
        debug!(?report, "watch");
        report
    }

    /// Stop observing one element. Its flags are left as they are.
    pub fn unwatch(&self, element: &E) {
        if let Some(observer) = &self.observer {
            observer.unobserve(element);
        }
    }

    pub fn disconnect(&self) {
        if let Some(observer) = &self.observer {
            observer.disconnect();
        }
    }
}

impl<E: Element> Drop for VisibilityMonitor<E> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn handle_entries<E: Element>(
    tracker: &Tracker<E>,
    on_intersect: &IntersectFn<E>,
    entries: &[IntersectionEntry<E>],
    observer: &dyn IntersectionObserver<E>,
) {
    for entry in entries {
        let element = &entry.target;
        let toggles = tracker.namespace().has_marker(element, AttrKey::SourceInView);

        if entry.is_visible() {
            if toggles {
                tracker.mark(Flag::InView, element, None);
            } else {
                observer.unobserve(element);
                on_intersect(element);
            }
        } else if toggles && tracker.check(Flag::InView, element) {
            tracker.clear(Flag::InView, element);
        }
    }
}
