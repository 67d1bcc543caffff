//! In-memory element tree
//!
//! A small, thread-safe stand-in for a DOM: attributes, live properties,
//! `currentSrc`, parent/child links, bubbling event listeners and a simple
//! selector engine (`tag`, `.class`, `#id`, `[attr]`, `[attr=value]`,
//! compounds of those, comma separated lists). Used by tests, benches and
//! headless hosts.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::{Element, Notification, Property};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Event listener: receives the event name and the notification
pub type Listener = Arc<dyn Fn(&str, &Notification<MemoryElement>) + Send + Sync>;

struct Node {
    id: u64,
    tag: String,
    attributes: BTreeMap<String, String>,
    properties: HashMap<Property, String>,
    current_src: Option<String>,
    children: Vec<MemoryElement>,
    parent: Option<Weak<Mutex<Node>>>,
    listeners: Vec<(String, Listener)>,
}

/// Handle to an in-memory element
#[derive(Clone)]
pub struct MemoryElement {
    node: Arc<Mutex<Node>>,
}

impl PartialEq for MemoryElement {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for MemoryElement {}

impl fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.lock();
        write!(f, "<{} #{}", node.tag, node.id)?;
        if let Some(id) = node.attributes.get("id") {
            write!(f, " id={id:?}")?;
        }
        write!(f, ">")
    }
}

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        MemoryElement {
            node: Arc::new(Mutex::new(Node {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                tag: tag.to_ascii_lowercase(),
                attributes: BTreeMap::new(),
                properties: HashMap::new(),
                current_src: None,
                children: Vec::new(),
                parent: None,
                listeners: Vec::new(),
            })),
        }
    }

    /// Unique node id (stable for the element's lifetime)
    pub fn node_id(&self) -> u64 {
        self.node.lock().id
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_property(self, property: Property, value: &str) -> Self {
        self.set_property(property, value);
        self
    }

    pub fn with_current_src(self, src: &str) -> Self {
        self.set_current_src(Some(src));
        self
    }

    pub fn with_child(self, child: MemoryElement) -> Self {
        self.append_child(&child);
        self
    }

    pub fn append_child(&self, child: &MemoryElement) {
        if let Some(old) = child.parent() {
            old.node.lock().children.retain(|c| c != child);
        }
        child.node.lock().parent = Some(Arc::downgrade(&self.node));
        self.node.lock().children.push(child.clone());
    }

    pub fn parent(&self) -> Option<MemoryElement> {
        let weak = self.node.lock().parent.clone()?;
        weak.upgrade().map(|node| MemoryElement { node })
    }

    /// Simulate the host selecting a rendered candidate
    pub fn set_current_src(&self, src: Option<&str>) {
        self.node.lock().current_src = src.map(str::to_owned);
    }

    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.node.lock().attributes.clone()
    }

    /// Listen for an event on this element (and, by bubbling, on descendants)
    pub fn add_listener(
        &self,
        event_name: &str,
        listener: impl Fn(&str, &Notification<MemoryElement>) + Send + Sync + 'static,
    ) {
        self.node
            .lock()
            .listeners
            .push((event_name.to_owned(), Arc::new(listener)));
    }

    /// Listen for every event on this element and its descendants
    pub fn add_wildcard_listener(
        &self,
        listener: impl Fn(&str, &Notification<MemoryElement>) + Send + Sync + 'static,
    ) {
        self.add_listener("*", listener);
    }

    /// All descendants, depth-first in document order (self excluded)
    pub fn descendants(&self) -> Vec<MemoryElement> {
        let mut out = Vec::new();
        for child in self.children() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }

    pub fn class_list(&self) -> Vec<String> {
        self.attribute("class")
            .map(|c| c.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// Does this element match a selector list?
    pub fn matches(&self, selectors: &str) -> bool {
        selectors
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .any(|s| self.matches_compound(s))
    }

    /// Descendants matching a selector list, in document order
    pub fn query_selector_all(&self, selectors: &str) -> Vec<MemoryElement> {
        self.descendants()
            .into_iter()
            .filter(|el| el.matches(selectors))
            .collect()
    }

    fn matches_compound(&self, selector: &str) -> bool {
        let tag_end = selector
            .find(['.', '#', '['])
            .unwrap_or(selector.len());
        let tag = &selector[..tag_end];
        if !tag.is_empty() && tag != "*" && !self.is_tag(tag) {
            return false;
        }

        let mut rest = &selector[tag_end..];
        while let Some(sigil) = rest.chars().next() {
            let body = &rest[sigil.len_utf8()..];
            if sigil == '[' {
                let Some(close) = body.find(']') else {
                    return false;
                };
                let inner = &body[..close];
                let ok = match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim_matches(|c| c == '"' || c == '\'');
                        self.attribute(name.trim()).as_deref() == Some(value)
                    }
                    None => self.has_attribute(inner.trim()),
                };
                if !ok {
                    return false;
                }
                rest = &body[close + 1..];
                continue;
            }

            let end = body.find(['.', '#', '[']).unwrap_or(body.len());
            let name = &body[..end];
            let ok = match sigil {
                '.' => self.class_list().iter().any(|c| c == name),
                '#' => self.attribute("id").as_deref() == Some(name),
                _ => false,
            };
            if !ok {
                return false;
            }
            rest = &body[end..];
        }
        true
    }

    fn listeners_for(&self, event_name: &str) -> Vec<Listener> {
        self.node
            .lock()
            .listeners
            .iter()
            .filter(|(name, _)| name == event_name || name == "*")
            .map(|(_, l)| l.clone())
            .collect()
    }
}

impl Element for MemoryElement {
    fn tag_name(&self) -> String {
        self.node.lock().tag.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.node.lock().attributes.get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.node
            .lock()
            .attributes
            .insert(name.to_owned(), value.to_owned());
    }

    fn remove_attribute(&self, name: &str) {
        self.node.lock().attributes.remove(name);
    }

    fn children(&self) -> Vec<Self> {
        self.node.lock().children.clone()
    }

    fn first_descendant(&self, tag: &str) -> Option<Self> {
        self.descendants().into_iter().find(|el| el.is_tag(tag))
    }

    fn property(&self, property: Property) -> Option<String> {
        self.node.lock().properties.get(&property).cloned()
    }

    fn set_property(&self, property: Property, value: &str) {
        self.node
            .lock()
            .properties
            .insert(property, value.to_owned());
    }

    fn current_src(&self) -> Option<String> {
        self.node.lock().current_src.clone()
    }

    /// Bubbles from this element up to the root. No lock is held while a
    /// listener runs, so listeners may freely touch the tree.
    fn dispatch(&self, event_name: &str, notification: &Notification<Self>) {
        let mut target = Some(self.clone());
        while let Some(current) = target {
            for listener in current.listeners_for(event_name) {
                listener(event_name, notification);
            }
            target = current.parent();
        }
    }
}
