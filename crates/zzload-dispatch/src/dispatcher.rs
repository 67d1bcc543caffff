//! Source dispatcher - the element lifecycle pipeline
//!
//! Stages of one dispatch:
//! 1. Guard: `processed` already set means nothing to do
//! 2. Mark `processed`, run the process-start callback
//! 3. Classify and run exactly one strategy
//! 4. On success: strip declarations (if enabled), mark `loaded`, notify,
//!    run `on_load`, fulfil the awaitable
//! 5. On failure: mark `failed`, notify, run `on_error`, reject the awaitable
//!
//! Failures are reported, never retried and never raised.

use std::rc::Rc;

use tracing::{debug, info, warn};
use zzload_core::{Element, Flag, MarkupError, Namespace, Options, Property, Tracker};

use crate::outcome::Reply;
use crate::{
    classify, commit_children, select_candidate, Completion, DispatchStatus, LoadOutcome,
    PendingLoad, ProbeOutcome, ProbeRequest, ResourceHost, Source, SourceKind,
};

/// Deferred write to the visible element
type Commit = Box<dyn FnOnce()>;

struct Inner<E: Element> {
    tracker: Tracker<E>,
    host: Rc<dyn ResourceHost<E>>,
    options: Rc<Options<E>>,
}

/// Source dispatcher. Cheap to clone; clones share state.
pub struct Dispatcher<E: Element> {
    inner: Rc<Inner<E>>,
}

impl<E: Element> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Dispatcher {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Element> Dispatcher<E> {
    pub fn new(tracker: Tracker<E>, host: Rc<dyn ResourceHost<E>>, options: Rc<Options<E>>) -> Self {
        Dispatcher {
            inner: Rc::new(Inner {
                tracker,
                host,
                options,
            }),
        }
    }

    pub fn tracker(&self) -> &Tracker<E> {
        &self.inner.tracker
    }

    pub fn options(&self) -> &Options<E> {
        &self.inner.options
    }

    /// Fire-and-forget dispatch
    pub fn dispatch(&self, element: &E) -> DispatchStatus {
        self.inner.run(element, None)
    }

    /// Dispatch and obtain an awaitable for the terminal outcome
    pub fn dispatch_awaitable(&self, element: &E) -> (DispatchStatus, PendingLoad<E>) {
        let (tx, pending) = PendingLoad::channel();
        let status = self.inner.run(element, Some(tx));
        (status, pending)
    }
}

impl<E: Element> Inner<E> {
    fn ns(&self) -> &Namespace {
        self.tracker.namespace()
    }

    fn run(self: &Rc<Self>, element: &E, reply: Reply<E>) -> DispatchStatus {
        // Stage 1: at-most-once guard
        if self.tracker.check(Flag::Processed, element) {
            debug!(?element, "already processed");
            return DispatchStatus::AlreadyProcessed;
        }

        // Stage 2: processed
        self.tracker.mark(Flag::Processed, element, None);
        self.options.callbacks.process_start(element);

        // Stage 3: one strategy
        let source = classify(element, self.ns());
        let kind = source.kind();
        debug!(?element, ?kind, "strategy selected");

        match source {
            Source::Image { src, srcset } => {
                let commit = {
                    let element = element.clone();
                    let (src, srcset) = (src.clone(), srcset.clone());
                    Box::new(move || {
                        if let Some(srcset) = &srcset {
                            element.set_property(Property::SrcSet, srcset);
                        }
                        element.set_property(Property::Src, &src);
                    }) as Commit
                };
                let request = ProbeRequest::new(src).with_srcset(srcset);
                self.probe_then_settle(element, request, commit, reply);
                DispatchStatus::Pending(kind)
            }
            Source::Background { src } => {
                let commit = {
                    let element = element.clone();
                    let value = format!("url({src})");
                    Box::new(move || element.set_property(Property::BackgroundImage, &value))
                        as Commit
                };
                self.probe_then_settle(element, ProbeRequest::new(src), commit, reply);
                DispatchStatus::Pending(kind)
            }
            Source::SvgImage { src, target } => {
                let commit = {
                    let src = src.clone();
                    Box::new(move || target.set_attribute("href", &src)) as Commit
                };
                self.probe_then_settle(element, ProbeRequest::new(src), commit, reply);
                DispatchStatus::Pending(kind)
            }
            Source::Iframe { src } => {
                let done = self.completion(element.clone(), None, reply);
                self.host.load_in_place(element, &src, done);
                DispatchStatus::Pending(kind)
            }
            Source::PictureContainer => self.load_picture(element, reply),
            Source::ContainerMarker => {
                self.settle(
                    LoadOutcome::Loaded {
                        element: element.clone(),
                        source: None,
                    },
                    reply,
                );
                DispatchStatus::Loaded
            }
            Source::Unrecognized => self.abort(element, MarkupError::NoSource),
        }
    }

    /// Probe, applying the commit now or on load depending on policy
    fn probe_then_settle(self: &Rc<Self>, element: &E, request: ProbeRequest, commit: Commit, reply: Reply<E>) {
        let deferred = if self.options.set_sources_only_on_load {
            Some(commit)
        } else {
            commit();
            None
        };
        let done = self.completion(element.clone(), deferred, reply);
        self.host.probe(request, done);
    }

    fn load_picture(self: &Rc<Self>, picture: &E, reply: Reply<E>) -> DispatchStatus {
        let origin = self.host.origin();
        let selection = match select_candidate(picture, self.ns(), origin.as_deref()) {
            Ok(selection) => selection,
            Err(error) => return self.abort(picture, error),
        };

        let commit = {
            let this = self.clone();
            let picture = picture.clone();
            Box::new(move || {
                commit_children(&picture, this.ns(), this.options.clear_source_attrs)
            }) as Commit
        };
        let done = self.completion(picture.clone(), Some(commit), reply);
        self.host.probe(selection.probe_request(), done);
        DispatchStatus::Pending(SourceKind::PictureContainer)
    }

    /// End a dispatch without a terminal outcome
    fn abort(&self, element: &E, error: MarkupError) -> DispatchStatus {
        if !error.is_configuration() {
            info!(?element, reason = %error, "nothing to load");
            return DispatchStatus::Unrecognized;
        }
        warn!(?element, %error, "zzload markup error; dispatch aborted");
        DispatchStatus::Aborted(error)
    }

    /// Single-shot completion turning a host outcome into a settlement
    fn completion(self: &Rc<Self>, element: E, on_success: Option<Commit>, reply: Reply<E>) -> Completion {
        let this = self.clone();
        Box::new(move |outcome: ProbeOutcome| {
            let outcome = match outcome {
                ProbeOutcome::Loaded { current_src } => {
                    if let Some(commit) = on_success {
                        commit();
                    }
                    LoadOutcome::Loaded {
                        element,
                        source: Some(current_src),
                    }
                }
                ProbeOutcome::Failed { src } => LoadOutcome::Failed {
                    element,
                    source: src,
                },
            };
            this.settle(outcome, reply);
        })
    }

    /// Stages 4 and 5
    fn settle(&self, outcome: LoadOutcome<E>, reply: Reply<E>) {
        match &outcome {
            LoadOutcome::Loaded { element, source } => {
                if self.options.clear_source_attrs {
                    self.tracker.strip_sources(element);
                }
                self.tracker.mark(Flag::Loaded, element, source.as_deref());
                self.options.callbacks.load(element, source.as_deref());
            }
            LoadOutcome::Failed { element, source } => {
                debug!(?element, %source, "load failed");
                self.tracker.mark(Flag::Failed, element, Some(source));
                self.options.callbacks.error(element, source);
            }
        }

        if let Some(tx) = reply {
            // The receiver may be gone; the outcome is already reported.
            let _ = tx.send(outcome.into());
        }
    }
}
