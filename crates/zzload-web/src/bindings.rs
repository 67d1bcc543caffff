//! JavaScript API
//!
//! ```js
//! const loader = new ZzLoad('.zzload', { rootMargin: '200px', onLoad: (el, src) => {} });
//! loader.observe();
//! await loader.triggerLoad(element);
//! ```

use std::rc::Rc;

use js_sys::{Function, Promise, Reflect};
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use zzload_core::{LoaderConfig, Options};
use zzload_runtime::{Targets, ZzLoad};

use crate::{detail, WebElement, WebPage};

fn callback(options: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(options, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
}

fn report(name: &str, result: Result<JsValue, JsValue>) {
    if let Err(error) = result {
        warn!(name, ?error, "callback threw");
    }
}

/// Options from a plain JS object. Unknown keys (and the callback
/// functions) are ignored by the config decoder.
fn options_from_js(value: &JsValue) -> Result<Options<WebElement>, JsValue> {
    let config: LoaderConfig = if value.is_undefined() || value.is_null() {
        LoaderConfig::default()
    } else {
        serde_wasm_bindgen::from_value(value.clone())?
    };
    let mut options =
        Options::from_config(&config).map_err(|e| JsValue::from_str(&e.to_string()))?;

    if let Some(f) = callback(value, "onProcessStart") {
        options = options.on_process_start(move |el: &WebElement| {
            report("onProcessStart", f.call1(&JsValue::NULL, el.as_raw()))
        });
    }
    if let Some(f) = callback(value, "onLoad") {
        options = options.on_load(move |el: &WebElement, src: Option<&str>| {
            let src = src.map_or(JsValue::NULL, JsValue::from_str);
            report("onLoad", f.call2(&JsValue::NULL, el.as_raw(), &src))
        });
    }
    if let Some(f) = callback(value, "onError") {
        options = options.on_error(move |el: &WebElement, src: &str| {
            report("onError", f.call2(&JsValue::NULL, el.as_raw(), &JsValue::from_str(src)))
        });
    }
    Ok(options)
}

fn targets_from_js(value: &JsValue) -> Targets<WebElement> {
    if let Some(selector) = value.as_string() {
        return Targets::Selector(selector);
    }
    if let Some(element) = value.dyn_ref::<web_sys::Element>() {
        return Targets::Element(WebElement(element.clone()));
    }
    if let Some(list) = value.dyn_ref::<web_sys::NodeList>() {
        let elements = (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .map(WebElement)
            .collect();
        return Targets::Collection(elements);
    }
    Targets::default()
}

#[wasm_bindgen(js_name = ZzLoad)]
pub struct JsZzLoad {
    inner: ZzLoad<WebElement>,
}

#[wasm_bindgen(js_class = ZzLoad)]
impl JsZzLoad {
    /// `targets`: selector string, element or NodeList (default `.zzload`)
    #[wasm_bindgen(constructor)]
    pub fn new(targets: JsValue, options: JsValue) -> Result<JsZzLoad, JsValue> {
        let page = WebPage::new().ok_or_else(|| JsValue::from_str("zzload needs a window"))?;
        let options = options_from_js(&options)?;
        let inner = ZzLoad::new(Rc::new(page), targets_from_js(&targets), options)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(JsZzLoad { inner })
    }

    /// Watch every matching element not yet observed; returns how many were
    /// newly registered or loaded
    pub fn observe(&self) -> u32 {
        let report = self.inner.observe();
        (report.registered + report.dispatched_immediately) as u32
    }

    /// Load now. Resolves with `{element, source}`, rejects with
    /// `{element, source}` on failure, resolves `undefined` when nothing was
    /// loaded. `undefined` instead of a promise if already processed.
    #[wasm_bindgen(js_name = triggerLoad)]
    pub fn trigger_load(&self, element: web_sys::Element) -> Option<Promise> {
        let pending = self.inner.trigger_load(&WebElement(element))?;
        Some(wasm_bindgen_futures::future_to_promise(async move {
            match pending.await {
                Some(Ok(loaded)) => Ok(detail(loaded.element.as_raw(), loaded.source.as_deref())),
                Some(Err(failure)) => Err(detail(failure.element.as_raw(), Some(&failure.source))),
                None => Ok(JsValue::UNDEFINED),
            }
        }))
    }

    #[wasm_bindgen(getter, js_name = isDegraded)]
    pub fn is_degraded(&self) -> bool {
        self.inner.is_degraded()
    }
}
