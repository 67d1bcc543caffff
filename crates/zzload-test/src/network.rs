//! Simulated network
//!
//! Every probe and in-place load becomes a pending fetch. Tests settle
//! fetches by URL, or switch to auto mode where each fetch settles as soon
//! as it is submitted. URLs registered with `fail` settle as failures.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use tracing::trace;
use zzload_dispatch::{Completion, ProbeOutcome, ProbeRequest};

/// How a fetch reached the network
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchKind {
    /// Detached probe image
    Probe,
    /// Element loading its own source (iframe)
    InPlace,
}

/// Log entry for one submitted fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRecord {
    pub kind: FetchKind,
    pub src: String,
    pub srcset: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SettleMode {
    #[default]
    Manual,
    Auto,
}

struct PendingFetch {
    request: ProbeRequest,
    done: Completion,
}

#[derive(Default)]
struct NetState {
    mode: SettleMode,
    pending: VecDeque<PendingFetch>,
    failing: HashSet<String>,
    /// Requested src -> candidate the "browser" reports as `currentSrc`
    candidates: HashMap<String, String>,
    log: Vec<FetchRecord>,
}

#[derive(Default)]
pub struct SimulatedNetwork {
    state: RefCell<NetState>,
}

impl SimulatedNetwork {
    /// Fetches wait for `succeed` / `reject` / `settle_all`
    pub fn manual() -> Self {
        Self::default()
    }

    /// Fetches settle during submission
    pub fn auto() -> Self {
        let network = Self::default();
        network.set_mode(SettleMode::Auto);
        network
    }

    pub fn set_mode(&self, mode: SettleMode) {
        self.state.borrow_mut().mode = mode;
    }

    /// Every future settlement of `src` is a failure
    pub fn fail(&self, src: &str) {
        self.state.borrow_mut().failing.insert(src.to_owned());
    }

    /// Report `candidate` as the fetched source when `src` loads, as a
    /// browser does after srcset negotiation
    pub fn resolve_as(&self, src: &str, candidate: &str) {
        self.state
            .borrow_mut()
            .candidates
            .insert(src.to_owned(), candidate.to_owned());
    }

    pub fn submit(&self, kind: FetchKind, request: ProbeRequest, done: Completion) {
        trace!(?kind, src = %request.src, "fetch submitted");
        let auto = {
            let mut state = self.state.borrow_mut();
            state.log.push(FetchRecord {
                kind,
                src: request.src.clone(),
                srcset: request.srcset.clone(),
            });
            state.mode == SettleMode::Auto
        };

        if auto {
            let outcome = self.outcome_for(&request, None);
            done(outcome);
        } else {
            self.state
                .borrow_mut()
                .pending
                .push_back(PendingFetch { request, done });
        }
    }

    /// Settle the oldest pending fetch of `src` successfully
    pub fn succeed(&self, src: &str) -> bool {
        self.settle(src, Some(true))
    }

    /// Settle the oldest pending fetch of `src` as a failure
    pub fn reject(&self, src: &str) -> bool {
        self.settle(src, Some(false))
    }

    /// Settle everything pending, honouring `fail`. Fetches submitted while
    /// settling are settled too.
    pub fn settle_all(&self) -> usize {
        let mut settled = 0;
        loop {
            let next = self.state.borrow_mut().pending.pop_front();
            let Some(fetch) = next else {
                return settled;
            };
            let outcome = self.outcome_for(&fetch.request, None);
            (fetch.done)(outcome);
            settled += 1;
        }
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub fn pending_sources(&self) -> Vec<String> {
        self.state
            .borrow()
            .pending
            .iter()
            .map(|f| f.request.src.clone())
            .collect()
    }

    /// Everything ever submitted, in order
    pub fn requests(&self) -> Vec<FetchRecord> {
        self.state.borrow().log.clone()
    }

    fn settle(&self, src: &str, loaded: Option<bool>) -> bool {
        let fetch = {
            let mut state = self.state.borrow_mut();
            let Some(index) = state.pending.iter().position(|f| f.request.src == src) else {
                return false;
            };
            state.pending.remove(index)
        };
        let Some(fetch) = fetch else {
            return false;
        };
        // The borrow is released: completions re-enter the loader.
        let outcome = self.outcome_for(&fetch.request, loaded);
        (fetch.done)(outcome);
        true
    }

    fn outcome_for(&self, request: &ProbeRequest, loaded: Option<bool>) -> ProbeOutcome {
        let state = self.state.borrow();
        let loaded = loaded.unwrap_or_else(|| !state.failing.contains(&request.src));
        if loaded {
            ProbeOutcome::Loaded {
                current_src: state
                    .candidates
                    .get(&request.src)
                    .cloned()
                    .unwrap_or_else(|| request.src.clone()),
            }
        } else {
            ProbeOutcome::Failed {
                src: request.src.clone(),
            }
        }
    }
}
