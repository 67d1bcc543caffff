//! Options captured at setup time
//!
//! Options are immutable once built: validated viewport settings for the
//! monitor, behavioral switches for the dispatcher, and three extension
//! callbacks.

use std::fmt;
use std::rc::Rc;

use crate::{ConfigResult, LoaderConfig, Namespace, ObserverSettings};

pub type ProcessStartFn<E> = Rc<dyn Fn(&E)>;
pub type LoadFn<E> = Rc<dyn Fn(&E, Option<&str>)>;
pub type ErrorFn<E> = Rc<dyn Fn(&E, &str)>;

/// Extension callbacks. Every one is optional.
pub struct Callbacks<E> {
    pub on_process_start: Option<ProcessStartFn<E>>,
    /// Receives the resolved source; `None` for container markers
    pub on_load: Option<LoadFn<E>>,
    /// Receives the attempted source
    pub on_error: Option<ErrorFn<E>>,
}

impl<E> Default for Callbacks<E> {
    fn default() -> Self {
        Callbacks {
            on_process_start: None,
            on_load: None,
            on_error: None,
        }
    }
}

impl<E> Clone for Callbacks<E> {
    fn clone(&self) -> Self {
        Callbacks {
            on_process_start: self.on_process_start.clone(),
            on_load: self.on_load.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<E> Callbacks<E> {
    pub fn process_start(&self, element: &E) {
        if let Some(cb) = &self.on_process_start {
            cb(element);
        }
    }

    pub fn load(&self, element: &E, source: Option<&str>) {
        if let Some(cb) = &self.on_load {
            cb(element, source);
        }
    }

    pub fn error(&self, element: &E, source: &str) {
        if let Some(cb) = &self.on_error {
            cb(element, source);
        }
    }
}

/// Immutable loader options
pub struct Options<E> {
    pub observer: ObserverSettings,
    pub clear_source_attrs: bool,
    pub set_sources_only_on_load: bool,
    pub namespace: Namespace,
    pub callbacks: Callbacks<E>,
}

impl<E> fmt::Debug for Options<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("observer", &self.observer)
            .field("clear_source_attrs", &self.clear_source_attrs)
            .field("set_sources_only_on_load", &self.set_sources_only_on_load)
            .field("namespace", &self.namespace)
            .field("on_process_start", &self.callbacks.on_process_start.is_some())
            .field("on_load", &self.callbacks.on_load.is_some())
            .field("on_error", &self.callbacks.on_error.is_some())
            .finish()
    }
}

impl<E> Clone for Options<E> {
    fn clone(&self) -> Self {
        Options {
            observer: self.observer.clone(),
            clear_source_attrs: self.clear_source_attrs,
            set_sources_only_on_load: self.set_sources_only_on_load,
            namespace: self.namespace.clone(),
            callbacks: self.callbacks.clone(),
        }
    }
}

impl<E> Default for Options<E> {
    fn default() -> Self {
        let config = LoaderConfig::default();
        Options {
            observer: ObserverSettings::default(),
            clear_source_attrs: config.clear_source_attrs,
            set_sources_only_on_load: config.set_sources_only_on_load,
            namespace: Namespace::default(),
            callbacks: Callbacks::default(),
        }
    }
}

impl<E> Options<E> {
    /// Validate a configuration document into options without callbacks
    pub fn from_config(config: &LoaderConfig) -> ConfigResult<Self> {
        Ok(Options {
            observer: config.validate()?,
            clear_source_attrs: config.clear_source_attrs,
            set_sources_only_on_load: config.set_sources_only_on_load,
            namespace: config.namespace(),
            callbacks: Callbacks::default(),
        })
    }

    pub fn on_process_start(mut self, f: impl Fn(&E) + 'static) -> Self {
        self.callbacks.on_process_start = Some(Rc::new(f));
        self
    }

    pub fn on_load(mut self, f: impl Fn(&E, Option<&str>) + 'static) -> Self {
        self.callbacks.on_load = Some(Rc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&E, &str) + 'static) -> Self {
        self.callbacks.on_error = Some(Rc::new(f));
        self
    }

    pub fn clear_source_attrs(mut self, enabled: bool) -> Self {
        self.clear_source_attrs = enabled;
        self
    }

    pub fn set_sources_only_on_load(mut self, enabled: bool) -> Self {
        self.set_sources_only_on_load = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_from_config_copies_switches() {
        let config = LoaderConfig {
            clear_source_attrs: false,
            set_sources_only_on_load: false,
            ..LoaderConfig::with_root_margin("200px")
        };
        let options: Options<()> = Options::from_config(&config).unwrap();
        assert!(!options.clear_source_attrs);
        assert!(!options.set_sources_only_on_load);
        assert_eq!(options.observer.root_margin_css, "200px 200px 200px 200px");
    }

    #[test]
    fn test_callbacks_fire_only_when_set() {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let options: Options<u8> = Options::default().on_error(move |_, src| {
            assert_eq!(src, "x.png");
            counter.set(counter.get() + 1);
        });

        options.callbacks.load(&1, Some("x.png"));
        options.callbacks.process_start(&1);
        options.callbacks.error(&1, "x.png");
        assert_eq!(hits.get(), 1);
    }
}
