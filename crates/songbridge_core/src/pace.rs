use std::time::Duration;

use async_trait::async_trait;

/// The named suspension points of the automation core.
///
/// Every deliberate wait goes through [`Pacer::pause`] with one of these
/// kinds, so tests can observe exactly which delays a component asked for
/// without spending wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseKind {
    /// Backoff delay between retry attempts.
    Backoff,
    /// Delay between convergence rounds while content loads.
    LoadSettle,
    /// Client-side rate-limiting gap between batch items.
    ItemGap,
    /// Short settle pause inside a flow (e.g. after navigation).
    FlowSettle,
}

/// The single injectable time-delay primitive.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Suspends the current flow for `duration` at the given point.
    async fn pause(&self, kind: PauseKind, duration: Duration);
}

/// A pacer that never waits. Useful in tests and dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacer;

#[async_trait]
impl Pacer for NoPacer {
    async fn pause(&self, _kind: PauseKind, _duration: Duration) {}
}
