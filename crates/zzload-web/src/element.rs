//! `Element` over a live DOM node

use std::fmt;

use js_sys::{Object, Reflect};
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CustomEvent, CustomEventInit, HtmlElement};
use zzload_core::{Element, Notification, Property};

#[derive(Clone, PartialEq, Eq)]
pub struct WebElement(pub web_sys::Element);

impl From<web_sys::Element> for WebElement {
    fn from(element: web_sys::Element) -> Self {
        WebElement(element)
    }
}

impl fmt::Debug for WebElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag_name())?;
        let id = self.0.id();
        if !id.is_empty() {
            write!(f, " id={id:?}")?;
        }
        write!(f, ">")
    }
}

impl WebElement {
    pub fn as_raw(&self) -> &web_sys::Element {
        &self.0
    }

    fn style_target(&self) -> Option<&HtmlElement> {
        self.0.dyn_ref::<HtmlElement>()
    }

    fn get(&self, key: &str) -> Option<String> {
        Reflect::get(&self.0, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_string())
    }
}

/// `{element, source}` payload carried by notifications
pub fn detail(element: &web_sys::Element, source: Option<&str>) -> JsValue {
    let detail = Object::new();
    let _ = Reflect::set(&detail, &"element".into(), element);
    let source = source.map_or(JsValue::NULL, JsValue::from_str);
    let _ = Reflect::set(&detail, &"source".into(), &source);
    detail.into()
}

impl Element for WebElement {
    fn tag_name(&self) -> String {
        self.0.tag_name().to_ascii_lowercase()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.0.has_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Err(error) = self.0.set_attribute(name, value) {
            warn!(element = ?self, name, ?error, "set_attribute failed");
        }
    }

    fn remove_attribute(&self, name: &str) {
        if let Err(error) = self.0.remove_attribute(name) {
            warn!(element = ?self, name, ?error, "remove_attribute failed");
        }
    }

    fn children(&self) -> Vec<Self> {
        let children = self.0.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .map(WebElement)
            .collect()
    }

    fn first_descendant(&self, tag: &str) -> Option<Self> {
        self.0.query_selector(tag).ok().flatten().map(WebElement)
    }

    fn property(&self, property: Property) -> Option<String> {
        match property {
            Property::Src | Property::SrcSet => self.get(property.dom_name()),
            Property::BackgroundImage => self
                .style_target()
                .and_then(|el| el.style().get_property_value(property.dom_name()).ok())
                .filter(|v| !v.is_empty()),
        }
    }

    fn set_property(&self, property: Property, value: &str) {
        let result = match property {
            Property::Src | Property::SrcSet => Reflect::set(
                &self.0,
                &JsValue::from_str(property.dom_name()),
                &JsValue::from_str(value),
            )
            .map(|_| ()),
            Property::BackgroundImage => match self.style_target() {
                Some(el) => el.style().set_property(property.dom_name(), value),
                None => Err(JsValue::from_str("element has no inline style")),
            },
        };
        if let Err(error) = result {
            warn!(element = ?self, ?property, ?error, "set_property failed");
        }
    }

    fn current_src(&self) -> Option<String> {
        self.get("currentSrc").filter(|s| !s.is_empty())
    }

    /// Bubbling `CustomEvent` with `{element, source}` as detail
    fn dispatch(&self, event_name: &str, notification: &Notification<Self>) {
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        init.set_detail(&detail(&notification.element.0, notification.source.as_deref()));

        let dispatched = CustomEvent::new_with_event_init_dict(event_name, &init)
            .and_then(|event| self.0.dispatch_event(&event));
        if let Err(error) = dispatched {
            warn!(element = ?self, event_name, ?error, "event dispatch failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::closure::Closure;
    use wasm_bindgen_test::*;
    use web_sys::Event;
    use zzload_core::NotificationKind;

    fn create(tag: &str) -> WebElement {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .expect("document");
        WebElement(document.create_element(tag).unwrap())
    }

    #[wasm_bindgen_test]
    fn test_notification_bubbles_with_detail() {
        let parent = create("div");
        let img = create("img");
        parent.as_raw().append_child(img.as_raw()).unwrap();

        let details: Rc<RefCell<Vec<JsValue>>> = Rc::default();
        let sink = details.clone();
        let listener = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let event: CustomEvent = event.unchecked_into();
            sink.borrow_mut().push(event.detail());
        });
        parent
            .as_raw()
            .add_event_listener_with_callback("zzload:loaded", listener.as_ref().unchecked_ref())
            .unwrap();

        let notification = Notification::new(NotificationKind::Loaded, img.clone())
            .with_source(Some("/a.png".into()));
        img.dispatch("zzload:loaded", &notification);

        let details = details.borrow();
        assert_eq!(details.len(), 1);
        let element = Reflect::get(&details[0], &"element".into()).unwrap();
        assert_eq!(element, JsValue::from(img.as_raw().clone()));
        let source = Reflect::get(&details[0], &"source".into()).unwrap();
        assert_eq!(source.as_string().as_deref(), Some("/a.png"));
    }

    #[wasm_bindgen_test]
    fn test_missing_source_is_null() {
        let el = create("div");
        let value = detail(el.as_raw(), None);
        assert!(Reflect::get(&value, &"source".into()).unwrap().is_null());
    }

    #[wasm_bindgen_test]
    fn test_properties() {
        let img = create("IMG");
        assert_eq!(img.tag_name(), "img");

        img.set_property(Property::SrcSet, "/a@2x.png 2x");
        assert_eq!(img.property(Property::SrcSet).as_deref(), Some("/a@2x.png 2x"));
        assert!(!img.has_attribute("data-zzload-is-loaded"));
        img.set_attribute("data-zzload-is-loaded", "");
        assert_eq!(img.attribute("data-zzload-is-loaded").as_deref(), Some(""));

        let div = create("div");
        assert_eq!(div.property(Property::BackgroundImage), None);
        div.set_property(Property::BackgroundImage, "url(\"/b.png\")");
        assert_eq!(
            div.property(Property::BackgroundImage).as_deref(),
            Some("url(\"/b.png\")")
        );
    }
}
