//! End-to-end scenarios over the public entry
//!
//! A `Harness` is one page, one loader and one recorder. Notifications are
//! captured as real events bubbling to the page body, so the element event
//! path is exercised on every run.

use std::rc::Rc;

use zzload_core::{AttrKey, ConfigResult, Element, MemoryElement, Options};
use zzload_runtime::{Targets, ZzLoad};

use crate::{MemoryPage, Recorder};

pub struct Harness {
    pub page: Rc<MemoryPage>,
    pub loader: ZzLoad<MemoryElement>,
    pub recorder: Recorder,
}

impl Harness {
    /// Manual network, default viewport, `.zzload` targets
    pub fn new(options: Options<MemoryElement>) -> ConfigResult<Self> {
        Harness::with_page(MemoryPage::default(), Targets::default(), options)
    }

    pub fn with_page(
        page: MemoryPage,
        targets: Targets<MemoryElement>,
        options: Options<MemoryElement>,
    ) -> ConfigResult<Self> {
        let page = page.shared();
        let recorder = Recorder::new();
        recorder.listen(page.body(), &options.namespace);
        let options = recorder.attach(options);
        let loader = ZzLoad::new(page.clone(), targets, options)?;
        Ok(Harness {
            page,
            loader,
            recorder,
        })
    }

    /// Element carrying the default target class and the given declarations,
    /// appended to the body
    pub fn lazy(&self, tag: &str, declarations: &[(AttrKey, &str)]) -> MemoryElement {
        let element = self.markup(tag, declarations).with_attr("class", "zzload");
        self.page.append(element)
    }

    /// Detached element with declarations in the loader's namespace
    pub fn markup(&self, tag: &str, declarations: &[(AttrKey, &str)]) -> MemoryElement {
        let ns = self.loader.namespace();
        declarations
            .iter()
            .fold(MemoryElement::new(tag), |el, (key, value)| el.with_attr(ns.attr(*key), value))
    }

    pub fn has(&self, element: &MemoryElement, key: AttrKey) -> bool {
        element.has_attribute(self.loader.namespace().attr(key))
    }
}
