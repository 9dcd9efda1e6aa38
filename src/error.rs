//! Error types.

use crate::scene::{SceneId, TransitionState};

/// A transition that could not finish.
///
/// Returned from [`SceneTransitionDriver::tick`](crate::SceneTransitionDriver::tick).
/// By the time the host sees one, the driver has already abandoned the request
/// and settled back into `Run`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("loading scene '{scene}' failed: {reason}")]
    LoadFailed { scene: SceneId, reason: String },

    #[error("reclaiming unused assets failed: {reason}")]
    ReclaimFailed { reason: String },

    #[error("transition stalled in {state} after {ticks} ticks")]
    Stalled { state: TransitionState, ticks: u32 },
}

/// Failure to read or parse an [`AppConfig`](crate::AppConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
