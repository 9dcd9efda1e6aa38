//! Transition states and per-tick outcomes for scene switching.

/// The steps of a scene transition, in cycle order.
///
/// The driver visits these in sequence, one handler per tick. Every state has a
/// single successor given by [`next`](Self::next); only `Run` waits on a
/// condition (a new target) before wrapping back to `Reset`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransitionState {
    /// Drop references to the outgoing scene and hint a resource sweep.
    #[default]
    Reset,
    /// Kick off the asynchronous load of the target scene.
    Preload,
    /// Wait for the scene load to finish.
    Load,
    /// Start, then wait for, reclamation of assets the new scene doesn't use.
    Unload,
    /// Commit the loaded scene as current.
    Postload,
    /// Last chance to prepare before the scene runs.
    Ready,
    /// Scene is live; watch for a new target.
    Run,
}

impl TransitionState {
    /// Every state in cycle order.
    pub const ALL: [TransitionState; 7] = [
        TransitionState::Reset,
        TransitionState::Preload,
        TransitionState::Load,
        TransitionState::Unload,
        TransitionState::Postload,
        TransitionState::Ready,
        TransitionState::Run,
    ];

    /// The state that follows this one once its condition is met.
    pub fn next(self) -> Self {
        match self {
            TransitionState::Reset => TransitionState::Preload,
            TransitionState::Preload => TransitionState::Load,
            TransitionState::Load => TransitionState::Unload,
            TransitionState::Unload => TransitionState::Postload,
            TransitionState::Postload => TransitionState::Ready,
            TransitionState::Ready => TransitionState::Run,
            TransitionState::Run => TransitionState::Reset,
        }
    }

    /// Whether this state polls an in-flight operation.
    pub fn is_waiting(self) -> bool {
        matches!(self, TransitionState::Load | TransitionState::Unload)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransitionState::Reset => "reset",
            TransitionState::Preload => "preload",
            TransitionState::Load => "load",
            TransitionState::Unload => "unload",
            TransitionState::Postload => "postload",
            TransitionState::Ready => "ready",
            TransitionState::Run => "run",
        }
    }
}

impl std::fmt::Display for TransitionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single [`tick`](super::SceneTransitionDriver::tick) did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The driver moved from one state to the next.
    Advanced {
        from: TransitionState,
        to: TransitionState,
    },
    /// The driver stayed put waiting on an in-flight operation.
    Waiting(TransitionState),
    /// Running with nothing to do.
    Idle,
}

impl TickOutcome {
    /// Returns `true` if this tick completed a transition into `Run`.
    pub fn entered_run(&self) -> bool {
        matches!(
            self,
            TickOutcome::Advanced {
                to: TransitionState::Run,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_walks_the_full_cycle() {
        let mut state = TransitionState::Reset;
        for expected in TransitionState::ALL.iter().skip(1) {
            state = state.next();
            assert_eq!(state, *expected);
        }
        assert_eq!(state.next(), TransitionState::Reset);
    }

    #[test]
    fn all_is_in_declaration_order() {
        let mut sorted = TransitionState::ALL;
        sorted.sort();
        assert_eq!(sorted, TransitionState::ALL);
    }

    #[test]
    fn only_load_and_unload_wait() {
        let waiting: Vec<_> = TransitionState::ALL
            .into_iter()
            .filter(|s| s.is_waiting())
            .collect();
        assert_eq!(waiting, vec![TransitionState::Load, TransitionState::Unload]);
    }
}
