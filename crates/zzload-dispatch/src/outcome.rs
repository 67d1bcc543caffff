//! Dispatch outcomes
//!
//! A dispatch ends in at most one `LoadOutcome`. Producing it is what
//! drives every consumer: flags, notifications, callbacks and the optional
//! awaitable. Callers choose synchronous or asynchronous consumption without
//! changing how notifications are delivered.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use zzload_core::MarkupError;

use crate::SourceKind;

/// Successful load
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loaded<E> {
    pub element: E,
    /// Resolved source; `None` for container markers
    pub source: Option<String>,
}

/// Failed load
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadFailure<E> {
    pub element: E,
    /// Source that was attempted
    pub source: String,
}

impl<E> fmt::Display for LoadFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load {}", self.source)
    }
}

impl<E: fmt::Debug> std::error::Error for LoadFailure<E> {}

pub type LoadResult<E> = Result<Loaded<E>, LoadFailure<E>>;

/// Terminal outcome of one dispatch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome<E> {
    Loaded { element: E, source: Option<String> },
    Failed { element: E, source: String },
}

impl<E> LoadOutcome<E> {
    pub fn element(&self) -> &E {
        match self {
            LoadOutcome::Loaded { element, .. } | LoadOutcome::Failed { element, .. } => element,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

impl<E> From<LoadOutcome<E>> for LoadResult<E> {
    fn from(outcome: LoadOutcome<E>) -> Self {
        match outcome {
            LoadOutcome::Loaded { element, source } => Ok(Loaded { element, source }),
            LoadOutcome::Failed { element, source } => Err(LoadFailure { element, source }),
        }
    }
}

/// What `dispatch` did synchronously
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchStatus {
    /// `processed` was already set; nothing happened
    AlreadyProcessed,
    /// A probe or in-place load is in flight (or already settled, if the
    /// host completed synchronously)
    Pending(SourceKind),
    /// Container marker, settled synchronously
    Loaded,
    /// Configuration error in the markup; logged, no terminal flag
    Aborted(MarkupError),
    /// No recognised source; logged, no terminal flag
    Unrecognized,
}

impl DispatchStatus {
    /// Will (or did) this dispatch produce a terminal outcome?
    pub fn settles(&self) -> bool {
        matches!(self, DispatchStatus::Pending(_) | DispatchStatus::Loaded)
    }
}

/// Sending half handed to settlement
pub(crate) type Reply<E> = Option<oneshot::Sender<LoadResult<E>>>;

/// Awaitable result of a dispatch
///
/// Resolves to `Some(Ok(..))` on load, `Some(Err(..))` on failure, and
/// `None` when the dispatch ended without a terminal outcome (already
/// processed, configuration error, no source). Dropping it does not cancel
/// the load.
#[derive(Debug)]
pub struct PendingLoad<E> {
    rx: oneshot::Receiver<LoadResult<E>>,
}

impl<E> PendingLoad<E> {
    pub(crate) fn channel() -> (oneshot::Sender<LoadResult<E>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, PendingLoad { rx })
    }

    /// Non-blocking check. `Ok(Some(_))` once settled, `Ok(None)` while in
    /// flight, `Err(())` if the dispatch ended without an outcome.
    #[allow(clippy::result_unit_err)]
    pub fn try_take(&mut self) -> Result<Option<LoadResult<E>>, ()> {
        match self.rx.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(oneshot::error::TryRecvError::Empty) => Ok(None),
            Err(oneshot::error::TryRecvError::Closed) => Err(()),
        }
    }
}

impl<E> Future for PendingLoad<E> {
    type Output = Option<LoadResult<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx).poll(cx).map(Result::ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_with_result() {
        let (tx, pending) = PendingLoad::<u8>::channel();
        tx.send(Ok(Loaded {
            element: 1,
            source: Some("a.png".into()),
        }))
        .unwrap();

        let result = pending.await.unwrap().unwrap();
        assert_eq!(result.source.as_deref(), Some("a.png"));
    }

    #[tokio::test]
    async fn test_dropped_sender_resolves_none() {
        let (tx, pending) = PendingLoad::<u8>::channel();
        drop(tx);
        assert!(pending.await.is_none());
    }

    #[test]
    fn test_try_take_states() {
        let (tx, mut pending) = PendingLoad::<u8>::channel();
        assert_eq!(pending.try_take(), Ok(None));
        tx.send(Err(LoadFailure {
            element: 2,
            source: "b.png".into(),
        }))
        .unwrap();
        let failure = pending.try_take().unwrap().unwrap().unwrap_err();
        assert_eq!(failure.to_string(), "failed to load b.png");
    }

    #[test]
    fn test_outcome_conversion() {
        let ok: LoadResult<u8> = LoadOutcome::Loaded {
            element: 1,
            source: None,
        }
        .into();
        assert_eq!(ok, Ok(Loaded { element: 1, source: None }));
        assert!(DispatchStatus::Loaded.settles());
        assert!(!DispatchStatus::Aborted(MarkupError::PictureWithoutImage).settles());
    }
}
