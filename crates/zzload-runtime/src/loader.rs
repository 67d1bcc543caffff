//! `ZzLoad` - the loader handle

use std::fmt;
use std::rc::Rc;

use tracing::debug;
use zzload_core::{
    ConfigResult, Element, Flag, LoaderConfig, Namespace, Options, Publisher, Tracker,
};
use zzload_dispatch::{DispatchStatus, Dispatcher, PendingLoad, ResourceHost};
use zzload_monitor::{ViewportHost, VisibilityMonitor, WatchReport};

use crate::{Document, Targets};

/// Everything a loader needs from its environment
pub trait Host<E: Element>: Document<E> + ResourceHost<E> + ViewportHost<E> {}

impl<E, T> Host<E> for T
where
    E: Element,
    T: Document<E> + ResourceHost<E> + ViewportHost<E>,
{
}

pub struct ZzLoad<E: Element> {
    document: Rc<dyn Document<E>>,
    targets: Targets<E>,
    options: Rc<Options<E>>,
    tracker: Tracker<E>,
    dispatcher: Dispatcher<E>,
    monitor: VisibilityMonitor<E>,
}

impl<E: Element> fmt::Debug for ZzLoad<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZzLoad")
            .field("targets", &self.targets)
            .field("options", &self.options)
            .field("monitor", &self.monitor)
            .finish()
    }
}

impl<E: Element> ZzLoad<E> {
    /// Loader publishing notifications as events on the elements. Fails
    /// only when the host's observer refuses the settings.
    pub fn new<H>(host: Rc<H>, targets: Targets<E>, options: Options<E>) -> ConfigResult<Self>
    where
        H: Host<E> + 'static,
    {
        let tracker = Tracker::new(Rc::new(options.namespace.clone()));
        Self::build(host, targets, options, tracker)
    }

    /// Loader with a custom notification publisher
    pub fn with_publisher<H>(
        host: Rc<H>,
        targets: Targets<E>,
        options: Options<E>,
        publisher: Rc<dyn Publisher<E>>,
    ) -> ConfigResult<Self>
    where
        H: Host<E> + 'static,
    {
        let tracker = Tracker::with_publisher(Rc::new(options.namespace.clone()), publisher);
        Self::build(host, targets, options, tracker)
    }

    /// Loader from a (possibly partial) configuration, without callbacks
    pub fn from_config<H>(host: Rc<H>, targets: Targets<E>, config: &LoaderConfig) -> ConfigResult<Self>
    where
        H: Host<E> + 'static,
    {
        Self::new(host, targets, Options::from_config(config)?)
    }

    fn build<H>(
        host: Rc<H>,
        targets: Targets<E>,
        options: Options<E>,
        tracker: Tracker<E>,
    ) -> ConfigResult<Self>
    where
        H: Host<E> + 'static,
    {
        let options = Rc::new(options);
        let dispatcher = Dispatcher::new(tracker.clone(), host.clone(), options.clone());

        let on_intersect = {
            let dispatcher = dispatcher.clone();
            Rc::new(move |element: &E| {
                dispatcher.dispatch(element);
            })
        };
        let monitor = VisibilityMonitor::new(tracker.clone(), &*host, &options.observer, on_intersect)?;

        Ok(ZzLoad {
            document: host,
            targets,
            options,
            tracker,
            dispatcher,
            monitor,
        })
    }

    /// Watch every target not yet observed. Selector targets are resolved
    /// again on each call.
    pub fn observe(&self) -> WatchReport {
        let elements = self.targets.resolve(&*self.document);
        self.monitor.watch(elements)
    }

    /// Load now, bypassing the monitor. `None` if the element was already
    /// processed.
    pub fn trigger_load(&self, element: &E) -> Option<PendingLoad<E>> {
        if self.tracker.check(Flag::Processed, element) {
            debug!(?element, "trigger_load on processed element");
            return None;
        }
        self.tracker.mark(Flag::Observed, element, None);
        self.monitor.unwatch(element);

        let (status, pending) = self.dispatcher.dispatch_awaitable(element);
        debug!(?element, ?status, "triggered");
        debug_assert_ne!(status, DispatchStatus::AlreadyProcessed);
        Some(pending)
    }

    pub fn options(&self) -> &Options<E> {
        &self.options
    }

    pub fn namespace(&self) -> &Namespace {
        self.tracker.namespace()
    }

    pub fn tracker(&self) -> &Tracker<E> {
        &self.tracker
    }

    pub fn targets(&self) -> &Targets<E> {
        &self.targets
    }

    /// True when the host had no intersection primitive
    pub fn is_degraded(&self) -> bool {
        self.monitor.is_degraded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use zzload_core::{AttrKey, MemoryElement, Property};
    use zzload_dispatch::{Completion, ProbeOutcome, ProbeRequest};
    use zzload_monitor::{IntersectionCallback, IntersectionEntry, IntersectionObserver};

    use zzload_core::ObserverSettings;

    /// Probes succeed at once; the observer records and lets the test fire
    /// entries.
    struct Page {
        body: MemoryElement,
        viewport: bool,
        watched: Rc<RefCell<Vec<MemoryElement>>>,
        callback: RefCell<Option<IntersectionCallback<MemoryElement>>>,
    }

    struct Watched(Rc<RefCell<Vec<MemoryElement>>>);

    impl IntersectionObserver<MemoryElement> for Watched {
        fn observe(&self, element: &MemoryElement) {
            self.0.borrow_mut().push(element.clone());
        }

        fn unobserve(&self, element: &MemoryElement) {
            self.0.borrow_mut().retain(|e| e != element);
        }
    }

    impl Page {
        fn new(viewport: bool) -> Rc<Self> {
            Rc::new(Page {
                body: MemoryElement::new("body"),
                viewport,
                watched: Rc::default(),
                callback: RefCell::new(None),
            })
        }

        fn scroll_into_view(&self, element: &MemoryElement) {
            let callback = self.callback.borrow().clone().expect("observer");
            let observer = Watched(self.watched.clone());
            callback(&[IntersectionEntry::new(element.clone(), 1.0, true)], &observer);
        }
    }

    impl Document<MemoryElement> for Page {
        fn query_selector_all(&self, selectors: &str) -> Vec<MemoryElement> {
            self.body.query_selector_all(selectors)
        }
    }

    impl ResourceHost<MemoryElement> for Page {
        fn origin(&self) -> Option<String> {
            None
        }

        fn probe(&self, request: ProbeRequest, done: Completion) {
            done(ProbeOutcome::Loaded {
                current_src: request.src,
            });
        }

        fn load_in_place(&self, element: &MemoryElement, src: &str, done: Completion) {
            element.set_property(Property::Src, src);
            done(ProbeOutcome::Loaded {
                current_src: src.to_owned(),
            });
        }
    }

    impl ViewportHost<MemoryElement> for Page {
        fn create_observer(
            &self,
            _settings: &ObserverSettings,
            callback: IntersectionCallback<MemoryElement>,
        ) -> ConfigResult<Option<Box<dyn IntersectionObserver<MemoryElement>>>> {
            if !self.viewport {
                return Ok(None);
            }
            *self.callback.borrow_mut() = Some(callback);
            Ok(Some(Box::new(Watched(self.watched.clone()))))
        }
    }

    fn lazy_img(src: &str) -> MemoryElement {
        MemoryElement::new("img")
            .with_attr("class", "zzload")
            .with_attr(Namespace::default().attr(AttrKey::SourceImg), src)
    }

    #[test]
    fn test_observe_picks_up_late_markup() {
        let page = Page::new(true);
        let loader = ZzLoad::new(page.clone(), Targets::default(), Options::default()).unwrap();

        page.body.append_child(&lazy_img("a.png"));
        assert_eq!(loader.observe().registered, 1);

        page.body.append_child(&lazy_img("b.png"));
        let report = loader.observe();
        assert_eq!((report.registered, report.skipped), (1, 1));
        assert_eq!(page.watched.borrow().len(), 2);
    }

    #[test]
    fn test_intersection_loads() {
        let page = Page::new(true);
        let img = lazy_img("a.png");
        page.body.append_child(&img);
        let loader = ZzLoad::new(page.clone(), Targets::default(), Options::default()).unwrap();

        loader.observe();
        page.scroll_into_view(&img);

        assert!(loader.tracker().check(Flag::Loaded, &img));
        assert_eq!(img.property(Property::Src).as_deref(), Some("a.png"));
        assert!(page.watched.borrow().is_empty());
    }

    #[test]
    fn test_degraded_loads_on_observe() {
        let page = Page::new(false);
        let img = lazy_img("a.png");
        page.body.append_child(&img);
        let loader = ZzLoad::new(page.clone(), Targets::Element(img.clone()), Options::default()).unwrap();

        assert!(loader.is_degraded());
        assert_eq!(loader.observe().dispatched_immediately, 1);
        assert!(loader.tracker().check(Flag::Loaded, &img));
    }

    #[tokio::test]
    async fn test_trigger_load_resolves() {
        let page = Page::new(true);
        let img = lazy_img("a.png");
        let loader = ZzLoad::new(page, Targets::Collection(vec![]), Options::default()).unwrap();

        let pending = loader.trigger_load(&img).expect("not yet processed");
        let loaded = pending.await.expect("settled").expect("loaded");
        assert_eq!(loaded.source.as_deref(), Some("a.png"));
        assert!(loader.tracker().check(Flag::Observed, &img));

        assert!(loader.trigger_load(&img).is_none());
    }

    #[test]
    fn test_from_config_rejects_bad_margin() {
        let page = Page::new(true);
        let config = LoaderConfig::with_root_margin("10em");
        assert!(ZzLoad::from_config(page, Targets::<MemoryElement>::default(), &config).is_err());
    }
}
