//! Simulated viewport
//!
//! Observers created here compute intersections from element layout boxes
//! against a scrollable root. `flush` plays the role of a rendering frame:
//! newly observed elements always get an initial entry, others only when a
//! threshold is crossed. `enter` / `leave` bypass geometry for scripted
//! scenarios.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use zzload_core::{ConfigError, ConfigResult, MemoryElement, ObserverSettings, RootMargin};
use zzload_monitor::{
    intersection_ratio, IntersectionCallback, IntersectionEntry, IntersectionObserver, Rect,
    Thresholds, ViewportHost,
};

type Sample = (f64, bool);

struct ObserverState {
    margin: RootMargin,
    thresholds: Thresholds,
    callback: IntersectionCallback<MemoryElement>,
    /// Watched elements with the last reported sample (`None` until the
    /// initial entry)
    watched: RefCell<Vec<(MemoryElement, Option<Sample>)>>,
    connected: Cell<bool>,
}

/// Observer handle given to the monitor
#[derive(Clone)]
pub struct SimulatedObserver {
    state: Rc<ObserverState>,
}

impl IntersectionObserver<MemoryElement> for SimulatedObserver {
    fn observe(&self, element: &MemoryElement) {
        let mut watched = self.state.watched.borrow_mut();
        if !watched.iter().any(|(e, _)| e == element) {
            watched.push((element.clone(), None));
        }
    }

    fn unobserve(&self, element: &MemoryElement) {
        self.state.watched.borrow_mut().retain(|(e, _)| e != element);
    }

    fn disconnect(&self) {
        self.state.watched.borrow_mut().clear();
        self.state.connected.set(false);
    }
}

impl SimulatedObserver {
    fn deliver(&self, entries: Vec<IntersectionEntry<MemoryElement>>) -> usize {
        if entries.is_empty() {
            return 0;
        }
        let observer: &dyn IntersectionObserver<MemoryElement> = self;
        (self.state.callback)(entries.as_slice(), observer);
        entries.len()
    }

    fn watches(&self, element: &MemoryElement) -> bool {
        self.state.watched.borrow().iter().any(|(e, _)| e == element)
    }
}

struct ViewportState {
    available: Cell<bool>,
    root: Cell<Rect>,
    layout: RefCell<HashMap<u64, Rect>>,
    observers: RefCell<Vec<Weak<ObserverState>>>,
}

/// Cheap to clone; clones share the same viewport
#[derive(Clone)]
pub struct SimulatedViewport {
    inner: Rc<ViewportState>,
}

impl Default for SimulatedViewport {
    fn default() -> Self {
        Self::new(Rect::new(0.0, 0.0, 1024.0, 768.0))
    }
}

impl SimulatedViewport {
    pub fn new(root: Rect) -> Self {
        SimulatedViewport {
            inner: Rc::new(ViewportState {
                available: Cell::new(true),
                root: Cell::new(root),
                layout: RefCell::new(HashMap::new()),
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Environment without an intersection primitive
    pub fn unavailable() -> Self {
        let viewport = Self::default();
        viewport.inner.available.set(false);
        viewport
    }

    /// Set an element's layout box. Elements without one have no area and
    /// sit outside the root.
    pub fn place(&self, element: &MemoryElement, rect: Rect) {
        self.inner.layout.borrow_mut().insert(element.node_id(), rect);
    }

    pub fn root(&self) -> Rect {
        self.inner.root.get()
    }

    /// Move the root to vertical offset `y`
    pub fn scroll_to(&self, y: f64) {
        let root = self.inner.root.get();
        self.inner.root.set(Rect::new(root.x, y, root.width, root.height));
    }

    /// Elements currently watched by any live observer
    pub fn watched_count(&self) -> usize {
        self.observers()
            .iter()
            .map(|o| o.state.watched.borrow().len())
            .sum()
    }

    pub fn is_watched(&self, element: &MemoryElement) -> bool {
        self.observers().iter().any(|o| o.watches(element))
    }

    /// Compute intersections and deliver entries. Returns how many entries
    /// were delivered.
    pub fn flush(&self) -> usize {
        let root = self.root();
        let mut delivered = 0;
        for observer in self.observers() {
            let entries = {
                let layout = self.inner.layout.borrow();
                let mut watched = observer.state.watched.borrow_mut();
                let mut entries = Vec::new();
                for (element, last) in watched.iter_mut() {
                    let sample = match layout.get(&element.node_id()) {
                        Some(rect) => intersection_ratio(rect, &root, &observer.state.margin),
                        None => (0.0, false),
                    };
                    let report = match last {
                        None => true,
                        Some(prev) => observer.state.thresholds.crossed(*prev, sample),
                    };
                    *last = Some(sample);
                    if report {
                        entries.push(IntersectionEntry::new(element.clone(), sample.0, sample.1));
                    }
                }
                entries
            };
            delivered += observer.deliver(entries);
        }
        delivered
    }

    /// Scripted entry into view, regardless of layout
    pub fn enter(&self, element: &MemoryElement) -> usize {
        self.script(element, (1.0, true))
    }

    /// Scripted exit from view, regardless of layout
    pub fn leave(&self, element: &MemoryElement) -> usize {
        self.script(element, (0.0, false))
    }

    fn script(&self, element: &MemoryElement, sample: Sample) -> usize {
        let mut delivered = 0;
        for observer in self.observers() {
            if !observer.watches(element) {
                continue;
            }
            if let Some(slot) = observer
                .state
                .watched
                .borrow_mut()
                .iter_mut()
                .find(|(e, _)| e == element)
            {
                slot.1 = Some(sample);
            }
            delivered += observer.deliver(vec![IntersectionEntry::new(
                element.clone(),
                sample.0,
                sample.1,
            )]);
        }
        delivered
    }

    fn observers(&self) -> Vec<SimulatedObserver> {
        let mut observers = self.inner.observers.borrow_mut();
        observers.retain(|w| w.strong_count() > 0);
        observers
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|state| state.connected.get())
            .map(|state| SimulatedObserver { state })
            .collect()
    }
}

/// Browsers accept only `px` and `%` lengths with finite values
fn check_margin_css(css: &str) -> ConfigResult<()> {
    let accepted = |token: &str| {
        token
            .strip_suffix("px")
            .or_else(|| token.strip_suffix('%'))
            .and_then(|n| n.parse::<f64>().ok())
            .is_some_and(f64::is_finite)
    };
    match css.split_whitespace().find(|t| !accepted(t)) {
        Some(token) => Err(ConfigError::ObserverRejected(format!(
            "rootMargin token {token:?} must be in pixels or percent"
        ))),
        None => Ok(()),
    }
}

impl ViewportHost<MemoryElement> for SimulatedViewport {
    fn create_observer(
        &self,
        settings: &ObserverSettings,
        callback: IntersectionCallback<MemoryElement>,
    ) -> ConfigResult<Option<Box<dyn IntersectionObserver<MemoryElement>>>> {
        if !self.inner.available.get() {
            return Ok(None);
        }
        check_margin_css(&settings.root_margin_css)?;
        let state = Rc::new(ObserverState {
            margin: settings.root_margin,
            thresholds: Thresholds::new(settings.thresholds.clone()),
            callback,
            watched: RefCell::new(Vec::new()),
            connected: Cell::new(true),
        });
        self.inner.observers.borrow_mut().push(Rc::downgrade(&state));
        Ok(Some(Box::new(SimulatedObserver { state })))
    }
}
