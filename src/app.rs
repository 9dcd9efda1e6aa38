use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::assets::{AssetStore, SceneDefinition, SharedStore, StoreLoader, StoreReclaimer};
use crate::error::{ConfigError, TransitionError};
use crate::scene::{SceneId, SceneTransitionDriver};

/// The driver used by [`run`], backed by an [`AssetStore`].
pub type StoreDriver = SceneTransitionDriver<StoreLoader, StoreReclaimer>;

type SceneHook = Box<dyn FnMut(&SceneId)>;

fn default_start_scene() -> SceneId {
    SceneId::new("scene1")
}

fn default_tick_rate() -> u32 {
    60
}

fn default_reclaim_frames() -> u32 {
    1
}

fn default_scenes() -> Vec<SceneDefinition> {
    vec![
        SceneDefinition::new("scene1")
            .asset("scene1/environment")
            .asset("shared/ui")
            .persistent("app/settings"),
        SceneDefinition::new("scene2")
            .asset("scene2/environment")
            .asset("shared/ui")
            .load_frames(30),
    ]
}

/// Host loop configuration.
///
/// Usually built in code with the chained setters, or read from TOML:
///
/// ```toml
/// start_scene = "menu"
/// tick_rate = 30
/// stall_timeout_ticks = 600
///
/// [[scenes]]
/// id = "menu"
/// assets = ["menu/background"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Scene loaded by the first cycle.
    #[serde(default = "default_start_scene")]
    pub start_scene: SceneId,

    /// Frames per second. `0` runs unthrottled.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,

    /// Stop after this many frames.
    #[serde(default)]
    pub max_frames: Option<u64>,

    /// Abandon transitions that wait this many ticks in `Load` or `Unload`.
    #[serde(default)]
    pub stall_timeout_ticks: Option<u32>,

    /// Polls each reclaim takes.
    #[serde(default = "default_reclaim_frames")]
    pub reclaim_frames: u32,

    #[serde(default = "default_scenes")]
    pub scenes: Vec<SceneDefinition>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            start_scene: default_start_scene(),
            tick_rate: default_tick_rate(),
            max_frames: None,
            stall_timeout_ticks: None,
            reclaim_frames: default_reclaim_frames(),
            scenes: default_scenes(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Read a config from a TOML file, falling back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("[config] using defaults, '{}': {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn start_scene(mut self, scene: impl Into<SceneId>) -> Self {
        self.start_scene = scene.into();
        self
    }

    pub fn tick_rate(mut self, rate: u32) -> Self {
        self.tick_rate = rate;
        self
    }

    pub fn max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn stall_timeout(mut self, ticks: u32) -> Self {
        self.stall_timeout_ticks = Some(ticks);
        self
    }

    pub fn reclaim_frames(mut self, frames: u32) -> Self {
        self.reclaim_frames = frames;
        self
    }

    /// Replace the scene list.
    pub fn scenes(mut self, scenes: Vec<SceneDefinition>) -> Self {
        self.scenes = scenes;
        self
    }

    /// Add a scene, replacing any with the same ID.
    pub fn scene(mut self, scene: SceneDefinition) -> Self {
        self.scenes.retain(|s| s.id != scene.id);
        self.scenes.push(scene);
        self
    }

    fn frame_duration(&self) -> Option<Duration> {
        (self.tick_rate > 0).then(|| Duration::from_secs_f64(1.0 / self.tick_rate as f64))
    }
}

/// Context provided during app setup.
pub struct SetupContext<'a> {
    pub store: &'a SharedStore,
    pub config: &'a AppConfig,
    on_enter: &'a mut Option<SceneHook>,
    on_exit: &'a mut Option<SceneHook>,
}

impl<'a> SetupContext<'a> {
    /// Register an extra scene with the store.
    pub fn scene(&mut self, scene: SceneDefinition) -> &mut Self {
        self.store.borrow_mut().register(scene);
        self
    }

    /// Run `callback` whenever a scene becomes current.
    pub fn on_enter<F: FnMut(&SceneId) + 'static>(&mut self, callback: F) -> &mut Self {
        *self.on_enter = Some(Box::new(callback));
        self
    }

    /// Run `callback` whenever the current scene is about to be replaced.
    pub fn on_exit<F: FnMut(&SceneId) + 'static>(&mut self, callback: F) -> &mut Self {
        *self.on_exit = Some(Box::new(callback));
        self
    }
}

/// Per-frame context handed to the frame closure.
pub struct Frame<'a> {
    /// Seconds since the loop started.
    pub time: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Index of this frame, starting at zero.
    pub index: u64,
    pub store: &'a SharedStore,
    driver: &'a StoreDriver,
    scene_switch: Option<SceneId>,
    quit: bool,
}

impl<'a> Frame<'a> {
    /// Request a switch to another scene.
    ///
    /// Applied after the frame closure returns, before the driver ticks.
    pub fn switch_to(&mut self, scene: impl Into<SceneId>) {
        self.scene_switch = Some(scene.into());
    }

    /// Stop the loop after this frame.
    pub fn quit(&mut self) {
        self.quit = true;
    }

    pub fn driver(&self) -> &StoreDriver {
        self.driver
    }

    pub fn current_scene(&self) -> Option<&SceneId> {
        self.driver.current_scene()
    }

    pub fn is_settled(&self) -> bool {
        self.driver.is_settled()
    }
}

/// What a finished [`run`] did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub frames: u64,
    /// Transitions that reached `Run`.
    pub transitions: u32,
    /// Transitions abandoned along the way.
    pub errors: Vec<TransitionError>,
    pub final_scene: Option<SceneId>,
}

/// Run a frame loop with the default configuration.
///
/// # Example
/// ```no_run
/// stagehand::run(|ctx| {
///     ctx.on_enter(|scene| log::info!("entered {}", scene));
///
///     move |frame| {
///         if frame.time > 3.0 {
///             frame.switch_to("scene2");
///         }
///     }
/// });
/// ```
pub fn run<S, F>(setup: S) -> RunSummary
where
    S: FnOnce(&mut SetupContext) -> F,
    F: FnMut(&mut Frame),
{
    run_with_config(AppConfig::default(), setup)
}

/// Run a frame loop with custom configuration.
///
/// Each frame runs the closure returned by `setup`, applies any scene switch it
/// requested, then ticks the driver once. Transition errors are logged and
/// collected; they never stop the loop. The loop ends when the closure calls
/// [`Frame::quit`] or after `max_frames`.
pub fn run_with_config<S, F>(config: AppConfig, setup: S) -> RunSummary
where
    S: FnOnce(&mut SetupContext) -> F,
    F: FnMut(&mut Frame),
{
    log::info!("[app] starting at '{}'", config.start_scene);

    let store = AssetStore::shared();
    {
        let mut store = store.borrow_mut();
        store.set_reclaim_frames(config.reclaim_frames);
        for scene in &config.scenes {
            store.register(scene.clone());
        }
    }

    let mut on_enter = None;
    let mut on_exit = None;
    let mut frame_fn = {
        let mut ctx = SetupContext {
            store: &store,
            config: &config,
            on_enter: &mut on_enter,
            on_exit: &mut on_exit,
        };
        setup(&mut ctx)
    };

    let mut driver = SceneTransitionDriver::new(
        AssetStore::loader(&store),
        AssetStore::reclaimer(&store),
        config.start_scene.clone(),
    );
    driver.set_stall_timeout(config.stall_timeout_ticks);
    if let Some(callback) = on_enter {
        driver = driver.on_enter(callback);
    }
    if let Some(callback) = on_exit {
        driver = driver.on_exit(callback);
    }

    let frame_duration = config.frame_duration();
    let start_time = Instant::now();
    let mut last_frame = start_time;
    let mut summary = RunSummary::default();

    loop {
        if config.max_frames.is_some_and(|max| summary.frames >= max) {
            break;
        }

        let frame_start = Instant::now();
        let dt = frame_start.duration_since(last_frame).as_secs_f32();
        last_frame = frame_start;

        let mut frame = Frame {
            time: frame_start.duration_since(start_time).as_secs_f32(),
            dt,
            index: summary.frames,
            store: &store,
            driver: &driver,
            scene_switch: None,
            quit: false,
        };
        frame_fn(&mut frame);
        let Frame {
            scene_switch, quit, ..
        } = frame;

        if let Some(scene) = scene_switch {
            driver.request_scene(scene);
        }

        match driver.tick() {
            Ok(outcome) if outcome.entered_run() => summary.transitions += 1,
            Ok(_) => {}
            Err(e) => {
                log::warn!("[app] frame {}: {}", summary.frames, e);
                summary.errors.push(e);
            }
        }
        summary.frames += 1;

        if quit {
            break;
        }

        if let Some(duration) = frame_duration {
            let elapsed = frame_start.elapsed();
            if elapsed < duration {
                std::thread::sleep(duration - elapsed);
            }
        }
    }

    summary.final_scene = driver.current_scene().cloned();
    log::info!(
        "[app] stopped after {} frames in '{}'",
        summary.frames,
        summary
            .final_scene
            .as_ref()
            .map_or("<none>", |scene| scene.as_str())
    );
    summary
}
