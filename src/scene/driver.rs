//! The scene transition driver.

use super::collaborators::{PendingOperation, ResourceReclaimer, SceneLoader};
use super::scene::SceneId;
use super::transition::{TickOutcome, TransitionState};
use crate::error::TransitionError;

/// A load that has been started, with the scene it was started for.
struct PendingLoad<H> {
    scene: SceneId,
    handle: H,
}

type SceneHook = Box<dyn FnMut(&SceneId)>;

/// What a state handler decided this tick.
enum Step {
    /// Move to the next state.
    Advance,
    /// Polled an operation that isn't done. Counts toward the stall timeout.
    Poll,
    /// Stay put without waiting on anything.
    Stay,
}

/// Drives scene switches one tick at a time.
///
/// The driver owns a [`SceneLoader`] and a [`ResourceReclaimer`] and walks the
/// [`TransitionState`] cycle, handing off to them and polling the handles they
/// return. It never blocks: a state that is waiting simply doesn't advance until
/// a later [`tick`](Self::tick) observes the operation as complete.
///
/// The host owns the driver and calls `tick` once per frame. Scene requests are
/// recorded immediately but acted on only when the cycle comes back around to
/// `Run`, so a request made mid-load never disturbs the load in flight.
///
/// # Example
///
/// ```
/// use stagehand::{AssetStore, SceneDefinition, SceneTransitionDriver, TransitionState};
///
/// let store = AssetStore::shared();
/// store.borrow_mut().register(SceneDefinition::new("menu").asset("menu/background"));
/// store.borrow_mut().register(SceneDefinition::new("level1").asset("level1/terrain"));
///
/// let mut driver = SceneTransitionDriver::new(
///     AssetStore::loader(&store),
///     AssetStore::reclaimer(&store),
///     "menu",
/// );
///
/// while driver.state() != TransitionState::Run {
///     driver.tick().unwrap();
/// }
/// assert_eq!(driver.current_scene().map(|s| s.as_str()), Some("menu"));
///
/// driver.request_scene("level1");
/// while !driver.is_settled() {
///     driver.tick().unwrap();
/// }
/// assert!(store.borrow().is_loaded("level1/terrain"));
/// assert!(!store.borrow().is_loaded("menu/background"));
/// ```
pub struct SceneTransitionDriver<L: SceneLoader, R: ResourceReclaimer> {
    loader: L,
    reclaimer: R,

    /// Current step of the cycle.
    state: TransitionState,

    /// Scene believed active. `None` until the first cycle completes.
    current: Option<SceneId>,

    /// Scene most recently requested.
    target: Option<SceneId>,

    /// Load in flight (only while in `Load`).
    load: Option<PendingLoad<L::Handle>>,

    /// Scene that finished loading, waiting for `Postload` to commit it.
    loaded: Option<SceneId>,

    /// Reclaim in flight (only while in `Unload`).
    reclaim: Option<R::Handle>,

    /// Consecutive incomplete polls in the current state.
    waited: u32,

    /// Give up after this many incomplete polls. Never `Some(0)`.
    stall_timeout: Option<u32>,

    on_enter: Option<SceneHook>,
    on_exit: Option<SceneHook>,
}

impl<L: SceneLoader, R: ResourceReclaimer> SceneTransitionDriver<L, R> {
    /// Create a driver that will load `initial` on its first cycle.
    pub fn new(loader: L, reclaimer: R, initial: impl Into<SceneId>) -> Self {
        Self {
            loader,
            reclaimer,
            state: TransitionState::Reset,
            current: None,
            target: Some(initial.into()),
            load: None,
            loaded: None,
            reclaim: None,
            waited: 0,
            stall_timeout: None,
            on_enter: None,
            on_exit: None,
        }
    }

    /// Abandon a transition after `ticks` incomplete polls in `Load` or `Unload`.
    ///
    /// The tick that starts the reclaim doesn't count. A timeout of `0` is
    /// treated as `1`. Without a timeout a collaborator that never completes
    /// stalls the driver indefinitely.
    pub fn with_stall_timeout(mut self, ticks: u32) -> Self {
        self.set_stall_timeout(Some(ticks));
        self
    }

    /// Set or clear the stall timeout.
    pub fn set_stall_timeout(&mut self, ticks: Option<u32>) {
        self.stall_timeout = ticks.map(|ticks| ticks.max(1));
    }

    /// Set a callback to run when a scene becomes current.
    ///
    /// Called from `Ready`, after the assets of the previous scene were reclaimed.
    pub fn on_enter<F: FnMut(&SceneId) + 'static>(mut self, callback: F) -> Self {
        self.on_enter = Some(Box::new(callback));
        self
    }

    /// Set a callback to run when a scene is about to be replaced.
    ///
    /// Called from `Reset` while the outgoing scene is still current.
    pub fn on_exit<F: FnMut(&SceneId) + 'static>(mut self, callback: F) -> Self {
        self.on_exit = Some(Box::new(callback));
        self
    }

    /// Request a switch to `scene`.
    ///
    /// Ignored if `scene` is already current. Otherwise it becomes the target and
    /// is picked up the next time the driver sits in `Run`. Returns whether the
    /// target changed.
    pub fn request_scene(&mut self, scene: impl Into<SceneId>) -> bool {
        let scene = scene.into();
        if self.current.as_ref() == Some(&scene) {
            return false;
        }
        if self.target.as_ref() == Some(&scene) {
            return false;
        }

        log::debug!("[scene] target set to '{}' (state: {})", scene, self.state);
        self.target = Some(scene);
        true
    }

    /// Run the handler for the current state.
    ///
    /// Performs at most one state transition. Errors are reported after the
    /// driver has already recovered to `Run`.
    pub fn tick(&mut self) -> Result<TickOutcome, TransitionError> {
        let from = self.state;
        log::trace!("[scene] tick in {}", from);

        let step = match from {
            TransitionState::Reset => self.update_reset(),
            TransitionState::Preload => self.update_preload(),
            TransitionState::Load => self.update_load(),
            TransitionState::Unload => self.update_unload(),
            TransitionState::Postload => self.update_postload(),
            TransitionState::Ready => self.update_ready(),
            TransitionState::Run => Ok(self.update_run()),
        };

        match step {
            Ok(Step::Advance) => {
                let to = from.next();
                log::debug!("[scene] {} -> {}", from, to);
                self.state = to;
                self.waited = 0;
                Ok(TickOutcome::Advanced { from, to })
            }
            Ok(Step::Stay) if from.is_waiting() => Ok(TickOutcome::Waiting(from)),
            Ok(Step::Stay) => Ok(TickOutcome::Idle),
            Ok(Step::Poll) => {
                self.waited += 1;
                match self.stall_timeout {
                    Some(limit) if self.waited >= limit => {
                        let err = TransitionError::Stalled {
                            state: from,
                            ticks: self.waited,
                        };
                        self.abandon(&err);
                        Err(err)
                    }
                    _ => Ok(TickOutcome::Waiting(from)),
                }
            }
            Err(err) => {
                self.abandon(&err);
                Err(err)
            }
        }
    }

    /// Get the current state.
    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Get the scene believed active.
    pub fn current_scene(&self) -> Option<&SceneId> {
        self.current.as_ref()
    }

    /// Get the most recently requested scene.
    pub fn target_scene(&self) -> Option<&SceneId> {
        self.target.as_ref()
    }

    /// Get the scene being loaded, if a load is in flight or awaiting commit.
    pub fn loading_scene(&self) -> Option<&SceneId> {
        self.load
            .as_ref()
            .map(|pending| &pending.scene)
            .or(self.loaded.as_ref())
    }

    /// Running with no outstanding request.
    pub fn is_settled(&self) -> bool {
        self.state == TransitionState::Run && !self.has_pending_request()
    }

    /// Check if a load or reclaim is in flight.
    pub fn is_busy(&self) -> bool {
        self.load.is_some() || self.reclaim.is_some()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn reclaimer(&self) -> &R {
        &self.reclaimer
    }

    fn has_pending_request(&self) -> bool {
        self.target.is_some() && self.target != self.current
    }

    fn update_reset(&mut self) -> Result<Step, TransitionError> {
        self.reclaimer.reclaim_hint();
        if let (Some(scene), Some(callback)) = (&self.current, self.on_exit.as_mut()) {
            callback(scene);
        }
        Ok(Step::Advance)
    }

    fn update_preload(&mut self) -> Result<Step, TransitionError> {
        if self.load.is_none() {
            if let Some(scene) = self.target.clone() {
                log::debug!("[scene] loading '{}'", scene);
                let handle = self.loader.begin_load(&scene);
                self.load = Some(PendingLoad { scene, handle });
            }
        }
        Ok(Step::Advance)
    }

    fn update_load(&mut self) -> Result<Step, TransitionError> {
        let Some(pending) = &self.load else {
            return Ok(Step::Advance);
        };
        if !pending.handle.is_complete() {
            return Ok(Step::Poll);
        }

        let failure = pending.handle.failure();
        let Some(PendingLoad { scene, .. }) = self.load.take() else {
            return Ok(Step::Advance);
        };
        match failure {
            Some(reason) => Err(TransitionError::LoadFailed { scene, reason }),
            None => {
                self.loaded = Some(scene);
                Ok(Step::Advance)
            }
        }
    }

    fn update_unload(&mut self) -> Result<Step, TransitionError> {
        let Some(handle) = &self.reclaim else {
            self.reclaim = Some(self.reclaimer.begin_reclaim());
            return Ok(Step::Stay);
        };
        if !handle.is_complete() {
            return Ok(Step::Poll);
        }

        let failure = handle.failure();
        self.reclaim = None;
        match failure {
            Some(reason) => Err(TransitionError::ReclaimFailed { reason }),
            None => Ok(Step::Advance),
        }
    }

    fn update_postload(&mut self) -> Result<Step, TransitionError> {
        if let Some(scene) = self.loaded.take() {
            log::info!("[scene] '{}' is now current", scene);
            self.current = Some(scene);
        }
        Ok(Step::Advance)
    }

    fn update_ready(&mut self) -> Result<Step, TransitionError> {
        self.reclaimer.reclaim_hint();
        if let (Some(scene), Some(callback)) = (&self.current, self.on_enter.as_mut()) {
            callback(scene);
        }
        Ok(Step::Advance)
    }

    fn update_run(&self) -> Step {
        if self.has_pending_request() {
            Step::Advance
        } else {
            Step::Stay
        }
    }

    /// Drop everything in flight and fall back to running the current scene.
    ///
    /// A scene that already finished loading is committed, since the loader has
    /// made it resident.
    fn abandon(&mut self, err: &TransitionError) {
        log::warn!("[scene] transition abandoned: {}", err);
        self.load = None;
        self.reclaim = None;
        if let Some(scene) = self.loaded.take() {
            log::info!("[scene] '{}' is now current", scene);
            self.current = Some(scene);
        }
        self.target = self.current.clone();
        self.waited = 0;
        self.state = TransitionState::Run;
    }
}
