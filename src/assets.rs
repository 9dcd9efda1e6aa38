//! In-memory asset store with scene loading and reclamation.
//!
//! [`AssetStore`] keeps every loaded asset as an entity in a `hecs` world,
//! tagged with the scene that owns it. [`StoreLoader`] and [`StoreReclaimer`]
//! implement the driver's collaborator traits on top of a shared store, doing
//! one frame of work per poll so transitions behave like real asynchronous
//! loads without any threads.
//!
//! # Example
//!
//! ```
//! use stagehand::{AssetStore, SceneDefinition};
//!
//! let store = AssetStore::shared();
//! store.borrow_mut().register(
//!     SceneDefinition::new("forest")
//!         .asset("trees")
//!         .asset("birdsong")
//!         .persistent("player")
//!         .load_frames(4),
//! );
//! assert!(store.borrow().scene(&"forest".into()).is_some());
//! ```

use crate::scene::{PendingOperation, ResourceReclaimer, SceneId, SceneLoader};
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Component naming a loaded asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
}

/// Component recording which scene last referenced an asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Owner(pub SceneId);

/// Marker for assets that survive every reclaim.
#[derive(Clone, Copy, Debug, Default)]
pub struct Persistent;

fn default_load_frames() -> u32 {
    1
}

/// Everything needed to load one scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDefinition {
    pub id: SceneId,

    /// Assets owned by the scene, freed once another scene replaces it.
    #[serde(default)]
    pub assets: Vec<String>,

    /// Assets the scene brings in that are never reclaimed.
    #[serde(default)]
    pub persistent: Vec<String>,

    /// Polls a load takes before it completes.
    #[serde(default = "default_load_frames")]
    pub load_frames: u32,
}

impl SceneDefinition {
    pub fn new(id: impl Into<SceneId>) -> Self {
        Self {
            id: id.into(),
            assets: Vec::new(),
            persistent: Vec::new(),
            load_frames: default_load_frames(),
        }
    }

    pub fn asset(mut self, name: impl Into<String>) -> Self {
        self.assets.push(name.into());
        self
    }

    pub fn persistent(mut self, name: impl Into<String>) -> Self {
        self.persistent.push(name.into());
        self
    }

    pub fn load_frames(mut self, frames: u32) -> Self {
        self.load_frames = frames;
        self
    }
}

/// Shared handle to an [`AssetStore`], held by the loader, the reclaimer and
/// the host.
pub type SharedStore = Rc<RefCell<AssetStore>>;

/// Registry of scenes plus the assets currently in memory.
pub struct AssetStore {
    world: World,

    /// Asset name to entity, for reuse across scenes.
    index: HashMap<String, Entity>,

    scenes: HashMap<SceneId, SceneDefinition>,

    /// The scene whose assets were loaded last.
    resident: Option<SceneId>,

    /// Polls a reclaim takes before it completes.
    reclaim_frames: u32,

    hints: u32,
    sweeps: u32,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            index: HashMap::new(),
            scenes: HashMap::new(),
            resident: None,
            reclaim_frames: 1,
            hints: 0,
            sweeps: 0,
        }
    }

    /// Create an empty store behind a shared handle.
    pub fn shared() -> SharedStore {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Create a loader backed by `store`.
    pub fn loader(store: &SharedStore) -> StoreLoader {
        StoreLoader {
            store: Rc::clone(store),
        }
    }

    /// Create a reclaimer backed by `store`.
    pub fn reclaimer(store: &SharedStore) -> StoreReclaimer {
        StoreReclaimer {
            store: Rc::clone(store),
        }
    }

    /// Register a scene, replacing any previous definition with the same ID.
    pub fn register(&mut self, scene: SceneDefinition) -> &mut Self {
        self.scenes.insert(scene.id.clone(), scene);
        self
    }

    /// Set how many polls each reclaim takes.
    pub fn set_reclaim_frames(&mut self, frames: u32) {
        self.reclaim_frames = frames;
    }

    pub fn scene(&self, id: &SceneId) -> Option<&SceneDefinition> {
        self.scenes.get(id)
    }

    /// The scene whose assets were loaded last.
    pub fn resident(&self) -> Option<&SceneId> {
        self.resident.as_ref()
    }

    /// Check whether an asset is in memory.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|&entity| self.world.contains(entity))
    }

    /// Names of every asset in memory, sorted.
    pub fn loaded_assets(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .world
            .query::<&Asset>()
            .iter()
            .map(|(_, asset)| asset.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn asset_count(&self) -> usize {
        self.world.len() as usize
    }

    /// How many reclaim hints have been received.
    pub fn hints(&self) -> u32 {
        self.hints
    }

    /// How many reclaims have run to completion.
    pub fn sweeps(&self) -> u32 {
        self.sweeps
    }

    /// Bring a scene's assets into memory and make it resident.
    ///
    /// Assets already in memory are reused and handed to the new scene.
    fn commit(&mut self, scene: &SceneDefinition) {
        let mut spawned = 0;

        for name in &scene.assets {
            match self.lookup(name) {
                Some(entity) => {
                    let persistent = self
                        .world
                        .entity(entity)
                        .is_ok_and(|e| e.has::<Persistent>());
                    if !persistent
                        && self
                            .world
                            .insert_one(entity, Owner(scene.id.clone()))
                            .is_err()
                    {
                        log::warn!("[assets] lost track of '{}'", name);
                    }
                }
                None => {
                    let entity = self.world.spawn((
                        Asset { name: name.clone() },
                        Owner(scene.id.clone()),
                    ));
                    self.index.insert(name.clone(), entity);
                    spawned += 1;
                }
            }
        }

        for name in &scene.persistent {
            if self.lookup(name).is_none() {
                let entity = self.world.spawn((
                    Asset { name: name.clone() },
                    Owner(scene.id.clone()),
                    Persistent,
                ));
                self.index.insert(name.clone(), entity);
                spawned += 1;
            }
        }

        log::debug!(
            "[assets] '{}' resident ({} new, {} total)",
            scene.id,
            spawned,
            self.asset_count()
        );
        self.resident = Some(scene.id.clone());
    }

    /// Free every non-persistent asset the resident scene doesn't own.
    ///
    /// Returns the number of assets freed.
    fn sweep(&mut self) -> usize {
        let unused: Vec<(Entity, String)> = self
            .world
            .query::<(&Asset, &Owner, Option<&Persistent>)>()
            .iter()
            .filter(|(_, (_, owner, persistent))| {
                persistent.is_none() && Some(&owner.0) != self.resident.as_ref()
            })
            .map(|(entity, (asset, _, _))| (entity, asset.name.clone()))
            .collect();

        for (entity, name) in &unused {
            if self.world.despawn(*entity).is_ok() {
                self.index.remove(name);
            }
        }

        self.sweeps += 1;
        log::debug!(
            "[assets] reclaimed {} assets ({} remain)",
            unused.len(),
            self.asset_count()
        );
        unused.len()
    }

    fn lookup(&self, name: &str) -> Option<Entity> {
        self.index
            .get(name)
            .copied()
            .filter(|&entity| self.world.contains(entity))
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts polls down to completion.
#[derive(Debug)]
struct FrameBudget {
    left: Cell<u32>,
}

impl FrameBudget {
    fn new(frames: u32) -> Self {
        Self {
            left: Cell::new(frames),
        }
    }

    /// Spend one frame. Returns `true` once the budget is exhausted.
    fn spend(&self) -> bool {
        let left = self.left.get();
        if left > 1 {
            self.left.set(left - 1);
            false
        } else {
            self.left.set(0);
            true
        }
    }
}

/// Loads registered scenes into an [`AssetStore`].
pub struct StoreLoader {
    store: SharedStore,
}

impl SceneLoader for StoreLoader {
    type Handle = LoadTicket;

    fn begin_load(&mut self, scene: &SceneId) -> LoadTicket {
        let definition = self.store.borrow().scene(scene).cloned();
        match definition {
            Some(definition) => LoadTicket {
                store: Rc::clone(&self.store),
                budget: FrameBudget::new(definition.load_frames),
                scene: Some(definition),
                done: Cell::new(false),
            },
            None => {
                log::warn!("[assets] scene '{}' is not registered", scene);
                LoadTicket {
                    store: Rc::clone(&self.store),
                    budget: FrameBudget::new(0),
                    scene: None,
                    done: Cell::new(true),
                }
            }
        }
    }
}

/// A scene load in progress.
///
/// Each poll of [`is_complete`](PendingOperation::is_complete) is one frame of
/// work. The scene's assets appear in the store on the final frame.
pub struct LoadTicket {
    store: SharedStore,
    budget: FrameBudget,
    /// `None` when the requested scene was never registered.
    scene: Option<SceneDefinition>,
    done: Cell<bool>,
}

impl PendingOperation for LoadTicket {
    fn is_complete(&self) -> bool {
        if self.done.get() {
            return true;
        }
        if !self.budget.spend() {
            return false;
        }
        if let Some(scene) = &self.scene {
            self.store.borrow_mut().commit(scene);
        }
        self.done.set(true);
        true
    }

    fn failure(&self) -> Option<String> {
        match self.scene {
            Some(_) => None,
            None => Some("scene is not registered".to_string()),
        }
    }
}

/// Frees assets that the resident scene no longer owns.
pub struct StoreReclaimer {
    store: SharedStore,
}

impl ResourceReclaimer for StoreReclaimer {
    type Handle = ReclaimTicket;

    fn begin_reclaim(&mut self) -> ReclaimTicket {
        let frames = self.store.borrow().reclaim_frames;
        ReclaimTicket {
            store: Rc::clone(&self.store),
            budget: FrameBudget::new(frames),
            freed: Cell::new(None),
        }
    }

    fn reclaim_hint(&mut self) {
        let mut store = self.store.borrow_mut();
        store.hints += 1;
        log::trace!("[assets] reclaim hint #{}", store.hints);
    }
}

/// A reclaim in progress.
pub struct ReclaimTicket {
    store: SharedStore,
    budget: FrameBudget,
    freed: Cell<Option<usize>>,
}

impl ReclaimTicket {
    /// How many assets were freed, once complete.
    pub fn freed(&self) -> Option<usize> {
        self.freed.get()
    }
}

impl PendingOperation for ReclaimTicket {
    fn is_complete(&self) -> bool {
        if self.freed.get().is_some() {
            return true;
        }
        if !self.budget.spend() {
            return false;
        }
        let freed = self.store.borrow_mut().sweep();
        self.freed.set(Some(freed));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_scene_store() -> SharedStore {
        let store = AssetStore::shared();
        store
            .borrow_mut()
            .register(
                SceneDefinition::new("menu")
                    .asset("ui/buttons")
                    .asset("music/theme")
                    .persistent("player/profile"),
            )
            .register(
                SceneDefinition::new("level")
                    .asset("terrain")
                    .asset("music/theme")
                    .load_frames(3),
            );
        store
    }

    fn finish(op: &impl PendingOperation) -> u32 {
        let mut polls = 1;
        while !op.is_complete() {
            polls += 1;
        }
        polls
    }

    #[test]
    fn load_spends_its_frames_then_commits() {
        let store = two_scene_store();
        let mut loader = AssetStore::loader(&store);

        let ticket = loader.begin_load(&SceneId::new("level"));
        assert!(!ticket.is_complete());
        assert!(!ticket.is_complete());
        assert!(!store.borrow().is_loaded("terrain"));
        assert!(ticket.is_complete());
        assert!(ticket.is_complete());

        let store = store.borrow();
        assert_eq!(store.resident().unwrap(), "level");
        assert_eq!(store.loaded_assets(), vec!["music/theme", "terrain"]);
        assert!(ticket.failure().is_none());
    }

    #[test]
    fn unknown_scene_fails_immediately() {
        let store = two_scene_store();
        let mut loader = AssetStore::loader(&store);

        let ticket = loader.begin_load(&SceneId::new("credits"));
        assert!(ticket.is_complete());
        assert!(ticket.failure().is_some());
        assert!(store.borrow().resident().is_none());
        assert_eq!(store.borrow().asset_count(), 0);
    }

    #[test]
    fn reclaim_frees_only_unowned_assets() {
        let store = two_scene_store();
        let mut loader = AssetStore::loader(&store);
        let mut reclaimer = AssetStore::reclaimer(&store);

        finish(&loader.begin_load(&SceneId::new("menu")));
        finish(&loader.begin_load(&SceneId::new("level")));
        assert!(store.borrow().is_loaded("ui/buttons"));

        let ticket = reclaimer.begin_reclaim();
        finish(&ticket);
        assert_eq!(ticket.freed(), Some(1));

        let store = store.borrow();
        assert!(!store.is_loaded("ui/buttons"));
        assert!(store.is_loaded("music/theme"));
        assert!(store.is_loaded("terrain"));
        assert!(store.is_loaded("player/profile"));
        assert_eq!(store.sweeps(), 1);
    }

    #[test]
    fn shared_assets_are_spawned_once() {
        let store = two_scene_store();
        let mut loader = AssetStore::loader(&store);

        finish(&loader.begin_load(&SceneId::new("menu")));
        finish(&loader.begin_load(&SceneId::new("level")));
        finish(&loader.begin_load(&SceneId::new("menu")));

        // ui/buttons, music/theme, player/profile, terrain
        assert_eq!(store.borrow().asset_count(), 4);
    }

    #[test]
    fn reclaim_takes_configured_frames() {
        let store = two_scene_store();
        store.borrow_mut().set_reclaim_frames(5);
        let mut reclaimer = AssetStore::reclaimer(&store);

        let ticket = reclaimer.begin_reclaim();
        assert_eq!(finish(&ticket), 5);
    }

    #[test]
    fn hints_are_counted() {
        let store = two_scene_store();
        let mut reclaimer = AssetStore::reclaimer(&store);
        reclaimer.reclaim_hint();
        reclaimer.reclaim_hint();
        assert_eq!(store.borrow().hints(), 2);
    }

    #[test]
    fn scene_definition_parses_from_toml() {
        let def: SceneDefinition = toml::from_str(
            r#"
            id = "cave"
            assets = ["rocks", "bats"]
            load_frames = 6
            "#,
        )
        .unwrap();

        assert_eq!(def.id, SceneId::new("cave"));
        assert_eq!(def.assets, vec!["rocks", "bats"]);
        assert!(def.persistent.is_empty());
        assert_eq!(def.load_frames, 6);
    }
}
