//! # Stagehand
//!
//! **Non-blocking scene transitions for frame-driven hosts.**
//!
//! A [`SceneTransitionDriver`] swaps the active scene one step per frame: it
//! starts an asynchronous load, waits for it, reclaims the assets the new scene
//! doesn't use, and commits the switch. Nothing ever blocks the frame.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stagehand::*;
//!
//! fn main() {
//!     let config = AppConfig::new()
//!         .start_scene("title")
//!         .scene(SceneDefinition::new("title").asset("title/logo"))
//!         .scene(SceneDefinition::new("level1").asset("level1/map").load_frames(90));
//!
//!     run_with_config(config, |ctx| {
//!         ctx.on_enter(|scene| println!("now playing {}", scene));
//!
//!         move |frame| {
//!             if frame.time > 2.0 {
//!                 frame.switch_to("level1");
//!             }
//!         }
//!     });
//! }
//! ```
//!
//! ## Bring your own engine
//!
//! The driver only needs a [`SceneLoader`] and a [`ResourceReclaimer`]. The
//! bundled [`AssetStore`] implements both in memory; an engine integration
//! implements them on top of its own asynchronous calls and ticks the driver
//! from its update loop.

mod app;
mod assets;
mod error;
pub mod scene;

pub use app::{
    AppConfig, Frame, RunSummary, SetupContext, StoreDriver, run, run_with_config,
};
pub use assets::{
    Asset, AssetStore, LoadTicket, Owner, Persistent, ReclaimTicket, SceneDefinition,
    SharedStore, StoreLoader, StoreReclaimer,
};
pub use error::{ConfigError, TransitionError};
pub use scene::{
    PendingOperation, ResourceReclaimer, SceneId, SceneLoader, SceneTransitionDriver,
    TickOutcome, TransitionState,
};
