//! The browser window as a loader host

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Reflect};
use tracing::{debug, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, EventTarget, HtmlImageElement, IntersectionObserverEntry, IntersectionObserverInit};
use zzload_core::{ConfigError, ConfigResult, Element, ObserverSettings, Property};
use zzload_dispatch::{Completion, ProbeOutcome, ProbeRequest, ResourceHost};
use zzload_monitor::{IntersectionCallback, IntersectionEntry, IntersectionObserver, ViewportHost};
use zzload_runtime::Document;

use crate::WebElement;

type Listener = Closure<dyn FnMut(Event)>;

/// One in-flight load. The listeners hold the slot and the slot holds the
/// listeners until `settle` detaches and drops them.
struct Pending {
    done: Option<Completion>,
    target: EventTarget,
    listeners: Option<(Listener, Listener)>,
}

type Slot = Rc<RefCell<Pending>>;

/// First call wins; later `load` / `error` events on the target reach no
/// listener.
fn settle(slot: &Slot, outcome: ProbeOutcome) {
    let (done, listeners) = {
        let mut pending = slot.borrow_mut();
        (pending.done.take(), pending.listeners.take())
    };
    if let Some((onload, onerror)) = &listeners {
        let target = slot.borrow().target.clone();
        let _ = target.remove_event_listener_with_callback("load", onload.as_ref().unchecked_ref());
        let _ = target.remove_event_listener_with_callback("error", onerror.as_ref().unchecked_ref());
    }
    if let Some(done) = done {
        done(outcome);
    }
}

/// Resolved source read off the event target (`currentSrc` for probes,
/// `src` for in-place loads)
fn loaded(event: &Event, key: &str, fallback: &str) -> ProbeOutcome {
    let current_src = event
        .target()
        .and_then(|target| Reflect::get(&target, &JsValue::from_str(key)).ok())
        .and_then(|value| value.as_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| fallback.to_owned());
    ProbeOutcome::Loaded { current_src }
}

/// Route the target's next `load` or `error` into `done`
fn listen(target: &EventTarget, src: &str, key: &'static str, done: Completion) {
    let slot: Slot = Rc::new(RefCell::new(Pending {
        done: Some(done),
        target: target.clone(),
        listeners: None,
    }));

    let onload: Listener = {
        let slot = slot.clone();
        let src = src.to_owned();
        Closure::new(move |event: Event| settle(&slot, loaded(&event, key, &src)))
    };
    let onerror: Listener = {
        let slot = slot.clone();
        let src = src.to_owned();
        Closure::new(move |_: Event| settle(&slot, ProbeOutcome::Failed { src: src.clone() }))
    };

    let attached = target
        .add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())
        .and_then(|_| target.add_event_listener_with_callback("error", onerror.as_ref().unchecked_ref()));
    slot.borrow_mut().listeners = Some((onload, onerror));

    if let Err(error) = attached {
        warn!(src, ?error, "could not attach load listeners");
        settle(&slot, ProbeOutcome::Failed { src: src.to_owned() });
    }
}

pub struct WebPage {
    window: web_sys::Window,
    document: web_sys::Document,
}

impl WebPage {
    /// `None` outside a window context (workers, non-browser runtimes)
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(WebPage { window, document })
    }

    fn has_intersection_observer(&self) -> bool {
        Reflect::get(&self.window, &JsValue::from_str("IntersectionObserver"))
            .map(|ctor| ctor.is_function())
            .unwrap_or(false)
    }
}

impl Document<WebElement> for WebPage {
    fn query_selector_all(&self, selectors: &str) -> Vec<WebElement> {
        let list = match self.document.query_selector_all(selectors) {
            Ok(list) => list,
            Err(error) => {
                warn!(selectors, ?error, "invalid selector");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .map(WebElement)
            .collect()
    }
}

impl ResourceHost<WebElement> for WebPage {
    fn origin(&self) -> Option<String> {
        self.window.location().origin().ok()
    }

    fn probe(&self, request: ProbeRequest, done: Completion) {
        let probe = match HtmlImageElement::new() {
            Ok(img) => img,
            Err(error) => {
                warn!(?error, "could not create probe image");
                done(ProbeOutcome::Failed { src: request.src });
                return;
            }
        };

        listen(&probe, &request.src, "currentSrc", done);
        if let Some(srcset) = &request.srcset {
            probe.set_srcset(srcset);
        }
        probe.set_src(&request.src);
        debug!(src = %request.src, "probe started");
    }

    fn load_in_place(&self, element: &WebElement, src: &str, done: Completion) {
        listen(element.as_raw(), src, "src", done);
        element.set_property(Property::Src, src);
    }
}

/// Native observer plus the closure it calls
pub struct WebObserver {
    inner: web_sys::IntersectionObserver,
    _callback: Option<Closure<dyn FnMut(Array, web_sys::IntersectionObserver)>>,
}

impl IntersectionObserver<WebElement> for WebObserver {
    fn observe(&self, element: &WebElement) {
        self.inner.observe(element.as_raw());
    }

    fn unobserve(&self, element: &WebElement) {
        self.inner.unobserve(element.as_raw());
    }

    fn disconnect(&self) {
        self.inner.disconnect();
    }
}

impl ViewportHost<WebElement> for WebPage {
    fn create_observer(
        &self,
        settings: &ObserverSettings,
        callback: IntersectionCallback<WebElement>,
    ) -> ConfigResult<Option<Box<dyn IntersectionObserver<WebElement>>>> {
        if !self.has_intersection_observer() {
            return Ok(None);
        }

        let closure = Closure::<dyn FnMut(Array, web_sys::IntersectionObserver)>::new(
            move |entries: Array, observer: web_sys::IntersectionObserver| {
                let entries: Vec<IntersectionEntry<WebElement>> = entries
                    .iter()
                    .filter_map(|e| e.dyn_into::<IntersectionObserverEntry>().ok())
                    .map(|e| {
                        IntersectionEntry::new(
                            WebElement(e.target()),
                            e.intersection_ratio(),
                            e.is_intersecting(),
                        )
                    })
                    .collect();
                let observer = WebObserver {
                    inner: observer,
                    _callback: None,
                };
                let observer: &dyn IntersectionObserver<WebElement> = &observer;
                callback(entries.as_slice(), observer);
            },
        );

        let thresholds: Array = settings
            .thresholds
            .iter()
            .map(|t| JsValue::from_f64(*t))
            .collect();
        let init = IntersectionObserverInit::new();
        init.set_root_margin(&settings.root_margin_css);
        init.set_threshold(&thresholds);

        let inner = web_sys::IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init)
            .map_err(|error| {
                let reason = error
                    .dyn_ref::<js_sys::Error>()
                    .map(|e| String::from(e.message()))
                    .unwrap_or_else(|| format!("{error:?}"));
                ConfigError::ObserverRejected(reason)
            })?;
        Ok(Some(Box::new(WebObserver {
            inner,
            _callback: Some(closure),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use js_sys::{Function, Promise};
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    const PIXEL: &str = "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";
    const BROKEN: &str = "data:image/png;base64,AAAA";

    fn page() -> WebPage {
        WebPage::new().expect("window")
    }

    /// Run a host call and wait for the completion it was handed
    async fn outcome_of(start: impl FnOnce(Completion)) -> ProbeOutcome {
        let slot: Rc<RefCell<Option<ProbeOutcome>>> = Rc::default();
        let sink = slot.clone();
        let mut start = Some(start);
        let promise = Promise::new(&mut |resolve: Function, _reject: Function| {
            if let Some(start) = start.take() {
                let sink = sink.clone();
                start(Box::new(move |outcome: ProbeOutcome| {
                    *sink.borrow_mut() = Some(outcome);
                    let _ = resolve.call0(&JsValue::NULL);
                }));
            }
        });
        JsFuture::from(promise).await.unwrap();
        let outcome = slot.borrow_mut().take();
        outcome.expect("settled")
    }

    fn noop_callback() -> IntersectionCallback<WebElement> {
        Rc::new(|_: &[IntersectionEntry<WebElement>], _: &dyn IntersectionObserver<WebElement>| {})
    }

    #[wasm_bindgen_test]
    async fn test_detached_image_reports_current_src() {
        let page = page();
        let outcome = outcome_of(|done| page.probe(ProbeRequest::new(PIXEL), done)).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Loaded {
                current_src: PIXEL.into()
            }
        );
    }

    #[wasm_bindgen_test]
    async fn test_detached_image_failure() {
        let page = page();
        let outcome = outcome_of(|done| page.probe(ProbeRequest::new(BROKEN), done)).await;
        assert_eq!(outcome, ProbeOutcome::Failed { src: BROKEN.into() });
    }

    #[wasm_bindgen_test]
    fn test_in_place_settles_once_and_detaches() {
        let page = page();
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();
        let frame = WebElement(document.create_element("iframe").unwrap());

        let errors = Rc::new(Cell::new(0));
        let on_error = {
            let errors = errors.clone();
            Closure::<dyn FnMut(Event)>::new(move |_: Event| errors.set(errors.get() + 1))
        };
        window
            .add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())
            .unwrap();

        let outcomes: Rc<RefCell<Vec<ProbeOutcome>>> = Rc::default();
        let sink = outcomes.clone();
        page.load_in_place(
            &frame,
            "/frame.html",
            Box::new(move |outcome: ProbeOutcome| sink.borrow_mut().push(outcome)),
        );

        // Navigations inside a frame fire `load` again on the same element
        for _ in 0..3 {
            let event = Event::new("load").unwrap();
            frame.as_raw().dispatch_event(&event).unwrap();
        }
        let event = Event::new("error").unwrap();
        frame.as_raw().dispatch_event(&event).unwrap();

        let _ = window.remove_event_listener_with_callback("error", on_error.as_ref().unchecked_ref());

        let outcomes = outcomes.borrow();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(errors.get(), 0);
        match &outcomes[0] {
            ProbeOutcome::Loaded { current_src } => {
                let origin = page.origin().unwrap();
                assert_eq!(*current_src, format!("{origin}/frame.html"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[wasm_bindgen_test]
    fn test_no_intersection_observer_is_degraded() {
        let window = web_sys::window().unwrap();
        let key = JsValue::from_str("IntersectionObserver");
        let saved = Reflect::get(&window, &key).unwrap();
        Reflect::delete_property(&window, &key).unwrap();

        let created = page().create_observer(&ObserverSettings::default(), noop_callback());

        Reflect::set(&window, &key, &saved).unwrap();
        assert!(matches!(created, Ok(None)));
    }

    #[wasm_bindgen_test]
    fn test_refused_margin_is_config_error() {
        let raw = ObserverSettings {
            root_margin_css: "0".into(),
            ..ObserverSettings::default()
        };
        assert!(matches!(
            page().create_observer(&raw, noop_callback()),
            Err(ConfigError::ObserverRejected(_))
        ));

        let settings = zzload_core::LoaderConfig::with_root_margin("0").validate().unwrap();
        assert!(matches!(page().create_observer(&settings, noop_callback()), Ok(Some(_))));
    }
}
