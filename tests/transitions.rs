use stagehand::{
    AssetStore, SceneDefinition, SceneId, SceneTransitionDriver, SharedStore, StoreDriver,
    TickOutcome, TransitionError, TransitionState,
};

fn store() -> SharedStore {
    let store = AssetStore::shared();
    store
        .borrow_mut()
        .register(
            SceneDefinition::new("A")
                .asset("a/level")
                .asset("common/hud")
                .persistent("audio/bank"),
        )
        .register(
            SceneDefinition::new("B")
                .asset("b/level")
                .asset("common/hud")
                .load_frames(4),
        );
    store.borrow_mut().set_reclaim_frames(3);
    store
}

fn driver(store: &SharedStore, initial: &str) -> StoreDriver {
    SceneTransitionDriver::new(AssetStore::loader(store), AssetStore::reclaimer(store), initial)
}

fn run_until_settled(driver: &mut StoreDriver) -> u32 {
    let mut ticks = 0;
    while !driver.is_settled() {
        driver.tick().unwrap();
        ticks += 1;
        assert!(ticks < 1000);
    }
    ticks
}

#[test]
fn first_cycle_tick_count() {
    let store = store();
    let mut driver = driver(&store, "A");

    // A loads on its first poll; reclaim takes a start tick plus three polls,
    // two of which are not complete.
    assert_eq!(run_until_settled(&mut driver), 6 + 3);
    assert_eq!(driver.current_scene().unwrap(), "A");
}

#[test]
fn switching_frees_the_old_scene() {
    let store = store();
    let mut driver = driver(&store, "A");
    run_until_settled(&mut driver);
    assert_eq!(
        store.borrow().loaded_assets(),
        vec!["a/level", "audio/bank", "common/hud"]
    );

    assert!(driver.request_scene("B"));
    assert_eq!(
        driver.tick().unwrap(),
        TickOutcome::Advanced {
            from: TransitionState::Run,
            to: TransitionState::Reset
        }
    );
    // Reset -> Run: 6 edges + 3 waiting load polls + 3 waiting unload ticks.
    assert_eq!(run_until_settled(&mut driver), 6 + 3 + 3);

    let store = store.borrow();
    assert_eq!(store.resident().unwrap(), "B");
    assert_eq!(
        store.loaded_assets(),
        vec!["audio/bank", "b/level", "common/hud"]
    );
    assert_eq!(store.sweeps(), 2);
    assert_eq!(store.hints(), 4);
}

#[test]
fn old_assets_stay_until_the_reclaim_finishes() {
    let store = store();
    let mut driver = driver(&store, "A");
    run_until_settled(&mut driver);
    driver.request_scene("B");

    while driver.state() != TransitionState::Unload {
        driver.tick().unwrap();
    }
    assert!(store.borrow().is_loaded("b/level"));
    assert!(store.borrow().is_loaded("a/level"));

    while driver.state() == TransitionState::Unload {
        driver.tick().unwrap();
    }
    assert!(!store.borrow().is_loaded("a/level"));
}

#[test]
fn request_during_load_waits_for_next_cycle() {
    let store = store();
    let mut driver = driver(&store, "A");
    run_until_settled(&mut driver);

    driver.request_scene("B");
    while driver.state() != TransitionState::Load {
        driver.tick().unwrap();
    }
    assert!(driver.request_scene("C"));
    assert!(driver.is_busy());

    while driver.state() != TransitionState::Run {
        driver.tick().unwrap();
    }
    assert_eq!(driver.current_scene().unwrap(), "B");
    assert_eq!(driver.target_scene().unwrap(), "C");

    // C was never registered, so the next cycle fails and B stays current.
    let err = loop {
        if let Err(err) = driver.tick() {
            break err;
        }
    };
    assert_eq!(
        err,
        TransitionError::LoadFailed {
            scene: SceneId::new("C"),
            reason: "scene is not registered".to_string()
        }
    );
    assert_eq!(driver.current_scene().unwrap(), "B");
    assert!(driver.is_settled());
    assert!(store.borrow().is_loaded("b/level"));
}

#[test]
fn returning_to_a_scene_reuses_shared_assets() {
    let store = store();
    let mut driver = driver(&store, "A");
    run_until_settled(&mut driver);

    for scene in ["B", "A", "B"] {
        driver.request_scene(scene);
        run_until_settled(&mut driver);
        assert_eq!(driver.current_scene().unwrap(), scene);
        assert!(store.borrow().is_loaded("common/hud"));
        assert!(store.borrow().is_loaded("audio/bank"));
        assert_eq!(store.borrow().asset_count(), 3);
    }
}

#[test]
fn unload_stall_leaves_driver_on_the_resident_scene() {
    let store = store();
    let mut driver = driver(&store, "A");
    run_until_settled(&mut driver);

    store.borrow_mut().set_reclaim_frames(1000);
    driver.set_stall_timeout(Some(5));
    driver.request_scene("B");

    let err = loop {
        if let Err(err) = driver.tick() {
            break err;
        }
    };
    assert_eq!(
        err,
        TransitionError::Stalled {
            state: TransitionState::Unload,
            ticks: 5
        }
    );

    // B finished loading before the reclaim stalled, so it is resident.
    assert_eq!(store.borrow().resident().unwrap(), "B");
    assert_eq!(driver.current_scene(), store.borrow().resident());
    assert!(driver.is_settled());
    assert_eq!(driver.tick().unwrap(), TickOutcome::Idle);

    // A's level was never swept; the next successful cycle frees it.
    assert!(store.borrow().is_loaded("a/level"));
    store.borrow_mut().set_reclaim_frames(1);
    driver.request_scene("A");
    run_until_settled(&mut driver);
    assert_eq!(driver.current_scene(), store.borrow().resident());
    assert!(!store.borrow().is_loaded("b/level"));
}
