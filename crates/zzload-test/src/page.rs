//! In-memory page implementing every host seam

use std::rc::Rc;

use zzload_core::{ConfigResult, Element, MemoryElement, ObserverSettings, Property};
use zzload_dispatch::{Completion, ProbeRequest, ResourceHost};
use zzload_monitor::{IntersectionCallback, IntersectionObserver, ViewportHost};
use zzload_runtime::Document;

use crate::{FetchKind, SimulatedNetwork, SimulatedViewport};

pub const DEFAULT_ORIGIN: &str = "https://example.com";

pub struct MemoryPage {
    body: MemoryElement,
    origin: Option<String>,
    pub network: SimulatedNetwork,
    pub viewport: SimulatedViewport,
}

impl Default for MemoryPage {
    fn default() -> Self {
        MemoryPage::new(SimulatedNetwork::manual(), SimulatedViewport::default())
    }
}

impl MemoryPage {
    pub fn new(network: SimulatedNetwork, viewport: SimulatedViewport) -> Self {
        MemoryPage {
            body: MemoryElement::new("body"),
            origin: Some(DEFAULT_ORIGIN.into()),
            network,
            viewport,
        }
    }

    pub fn with_origin(mut self, origin: Option<&str>) -> Self {
        self.origin = origin.map(str::to_owned);
        self
    }

    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub fn body(&self) -> &MemoryElement {
        &self.body
    }

    /// Append to the body and return the element
    pub fn append(&self, element: MemoryElement) -> MemoryElement {
        self.body.append_child(&element);
        element
    }
}

impl Document<MemoryElement> for MemoryPage {
    fn query_selector_all(&self, selectors: &str) -> Vec<MemoryElement> {
        self.body.query_selector_all(selectors)
    }
}

impl ResourceHost<MemoryElement> for MemoryPage {
    fn origin(&self) -> Option<String> {
        self.origin.clone()
    }

    fn probe(&self, request: ProbeRequest, done: Completion) {
        self.network.submit(FetchKind::Probe, request, done);
    }

    fn load_in_place(&self, element: &MemoryElement, src: &str, done: Completion) {
        element.set_property(Property::Src, src);
        self.network
            .submit(FetchKind::InPlace, ProbeRequest::new(src), done);
    }
}

impl ViewportHost<MemoryElement> for MemoryPage {
    fn create_observer(
        &self,
        settings: &ObserverSettings,
        callback: IntersectionCallback<MemoryElement>,
    ) -> ConfigResult<Option<Box<dyn IntersectionObserver<MemoryElement>>>> {
        self.viewport.create_observer(settings, callback)
    }
}
