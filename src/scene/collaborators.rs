//! Contracts for the asynchronous work a transition depends on.
//!
//! The driver never does the loading or the freeing itself. It asks a
//! [`SceneLoader`] and a [`ResourceReclaimer`] to start work, keeps the returned
//! handle, and polls it on later ticks.

use super::scene::SceneId;

/// An in-flight asynchronous operation.
///
/// Handles are polled once per tick. Implementations may do incremental work
/// inside [`is_complete`](Self::is_complete); the driver calls it at most once
/// per tick.
pub trait PendingOperation {
    /// Whether the operation has finished (successfully or not).
    fn is_complete(&self) -> bool;

    /// Why the operation failed, if it did.
    ///
    /// Only consulted after [`is_complete`](Self::is_complete) returns `true`.
    fn failure(&self) -> Option<String> {
        None
    }
}

/// Starts asynchronous scene loads.
///
/// The driver holds at most one load handle at a time.
pub trait SceneLoader {
    type Handle: PendingOperation;

    /// Begin loading `scene`, replacing whatever is resident once it completes.
    fn begin_load(&mut self, scene: &SceneId) -> Self::Handle;
}

/// Frees assets that no loaded scene references any more.
pub trait ResourceReclaimer {
    type Handle: PendingOperation;

    /// Begin an asynchronous sweep of unused assets.
    fn begin_reclaim(&mut self) -> Self::Handle;

    /// Advisory request for an immediate full sweep. No-op by default.
    fn reclaim_hint(&mut self) {}
}
