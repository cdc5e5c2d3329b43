//! Core traits for Arkalia sync.
//!
//! These traits are the seams between the sync agent and the outside world:
//! where snapshots come from, how local predictions are reconciled and what
//! happens when synchronization gives up.

use std::future::Future;
use std::sync::Arc;

use super::error::SourceError;
use crate::progression::ProgressionSnapshot;

/// A remote source of progression snapshots.
///
/// The production implementation is
/// [`HttpProgressionSource`](crate::source::HttpProgressionSource); tests use
/// scripted in-memory sources.
///
/// # Requirements
///
/// - `fetch` MUST return the complete server-side state (the agent replaces
///   its mirror wholesale, it never merges)
/// - `fetch` SHOULD NOT retry internally; retries and backoff belong to the
///   agent
pub trait ProgressionSource: Send + Sync + 'static {
    /// Fetch the current progression snapshot.
    fn fetch(&self) -> impl Future<Output = Result<ProgressionSnapshot, SourceError>> + Send;

    /// Short human-readable label used in logs.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

impl<P: ProgressionSource> ProgressionSource for Arc<P> {
    fn fetch(&self) -> impl Future<Output = Result<ProgressionSnapshot, SourceError>> + Send {
        (**self).fetch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// State that supports optimistic local prediction.
///
/// A local action may know the outcome before the server confirms it. The
/// prediction is applied immediately and later reconciled with the
/// authoritative state, which always wins.
pub trait Predictable {
    /// Local action type (e.g., score earned).
    type Input;

    /// Apply a speculative local change.
    fn predict(&mut self, input: &Self::Input);

    /// Reconcile with authoritative server state.
    fn reconcile(&mut self, authoritative: &Self);
}

/// Last-resort recovery run after synchronization failed terminally.
///
/// A web front end reloads the page here. Hooks run on the agent's
/// timer task and must not block.
pub trait RecoveryHook: Send + Sync + 'static {
    /// Perform recovery.
    fn recover(&self);
}

impl<F> RecoveryHook for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn recover(&self) {
        self()
    }
}
