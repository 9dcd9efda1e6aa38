//! Scene transitions for Stagehand.
//!
//! This module provides the [`SceneTransitionDriver`], a small state machine that
//! swaps the active scene without ever blocking the frame that drives it.
//!
//! # Overview
//!
//! Every frame the host calls [`SceneTransitionDriver::tick`]. Each tick runs the
//! handler for the current [`TransitionState`] and advances at most one step:
//!
//! ```text
//! Reset -> Preload -> Load -> Unload -> Postload -> Ready -> Run
//!   ^                                                        |
//!   +-------------------- new target requested --------------+
//! ```
//!
//! Loading and freeing are delegated to a [`SceneLoader`] and a
//! [`ResourceReclaimer`]. Both return [`PendingOperation`] handles that the
//! driver polls on later ticks.
//!
//! # Example
//!
//! ```ignore
//! let mut driver = SceneTransitionDriver::new(loader, reclaimer, "title")
//!     .with_stall_timeout(600)
//!     .on_enter(|scene| log::info!("entered {scene}"));
//!
//! loop {
//!     if input.start_pressed() {
//!         driver.request_scene("level1");
//!     }
//!     if let Err(e) = driver.tick() {
//!         log::warn!("{e}");
//!     }
//! }
//! ```

mod collaborators;
mod driver;
mod scene;
mod transition;

pub use collaborators::{PendingOperation, ResourceReclaimer, SceneLoader};
pub use driver::SceneTransitionDriver;
pub use scene::SceneId;
pub use transition::{TickOutcome, TransitionState};
