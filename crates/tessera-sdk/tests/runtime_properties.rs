// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tessera_sdk::prelude::*;
use tessera_telemetry::logging;
use tokio_util::sync::CancellationToken;

trait Inventory: Send + Sync {
    fn slots(&self) -> usize;
}

struct Backpack {
    slots: usize,
}

impl Inventory for Backpack {
    fn slots(&self) -> usize {
        self.slots
    }
}

#[derive(Default)]
struct SaveSystem;

impl Service for SaveSystem {
    fn create() -> Self {
        SaveSystem
    }
}

#[derive(Clone)]
struct Arrow {
    serial: usize,
    pose: Pose,
    active: bool,
}

impl Poolable for Arrow {
    fn pose(&self) -> &Pose {
        &self.pose
    }

    fn pose_mut(&mut self) -> &mut Pose {
        &mut self.pose
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

fn arrow_factory() -> impl Fn() -> Result<Arrow, PoolError> + Send + Sync + 'static {
    let serial = AtomicUsize::new(0);
    move || -> Result<Arrow, PoolError> {
        Ok(Arrow {
            serial: serial.fetch_add(1, Ordering::Relaxed),
            pose: Pose::NEUTRAL,
            active: false,
        })
    }
}

#[test]
fn test_single_writer_per_contract() {
    logging::init_for_tests();
    let mut runtime = Runtime::default();
    let context = runtime.context(ContextId::GLOBAL);

    let first: Arc<dyn Inventory> = Arc::new(Backpack { slots: 8 });
    let second: Arc<dyn Inventory> = Arc::new(Backpack { slots: 32 });
    context.register(first).unwrap();
    let rejected = context.register(second);

    assert!(matches!(rejected, Err(RegistryError::Duplicate { .. })));
    let bound = context.try_get::<dyn Inventory>().unwrap();
    assert_eq!(bound.slots(), 8);
}

#[test]
fn test_dead_targets_read_as_absent() {
    let mut runtime = Runtime::default();
    let context = runtime.context(ContextId::GLOBAL);

    let lifeline = Lifeline::new();
    let backpack: Arc<dyn Inventory> = Arc::new(Backpack { slots: 4 });
    context
        .register_host(backpack.clone(), lifeline.probe())
        .unwrap();
    assert!(context.try_get::<dyn Inventory>().is_some());

    lifeline.destroy();
    assert!(context.try_get::<dyn Inventory>().is_none());
    // The stale entry stays until it is unregistered.
    assert_eq!(context.unregister(&backpack), 1);
}

#[test]
fn test_contexts_are_isolated() {
    let mut runtime = Runtime::default();
    runtime
        .context(1u32)
        .register::<dyn Inventory>(Arc::new(Backpack { slots: 2 }))
        .unwrap();

    assert!(runtime.context(1u32).try_get::<dyn Inventory>().is_some());
    assert!(runtime.context(2u32).try_get::<dyn Inventory>().is_none());
}

#[test]
fn test_service_get_is_idempotent() {
    let mut runtime = Runtime::default();
    let a = runtime.services_mut().get::<SaveSystem>();
    let b = runtime.services_mut().get::<SaveSystem>();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_one_shot_and_fault_isolation() {
    let mut runtime = Runtime::default();
    let calls = Arc::new(Mutex::new(Vec::new()));

    let log = calls.clone();
    let persistent = listener(move |_: &u8| {
        log.lock().unwrap().push("persistent");
        Err(anyhow::anyhow!("persistent listener broke"))
    });
    let log = calls.clone();
    let once = listener(move |_: &u8| {
        log.lock().unwrap().push("once");
        Ok(())
    });
    runtime.signals_mut().subscribe(&persistent);
    runtime.signals_mut().subscribe_once(&once);

    let report = runtime.signals().dispatch(1u8);
    assert_eq!(report.invoked, 2);
    assert_eq!(report.failed, 1);
    runtime.signals().dispatch(2u8);

    assert_eq!(
        *calls.lock().unwrap(),
        vec!["persistent", "once", "persistent"]
    );
    assert_eq!(runtime.failures().total(), 2);
}

#[test]
fn test_pool_round_trip_resets_pose() {
    let mut runtime = Runtime::default();
    assert!(runtime.pools_mut().create_pool_with::<Arrow, _>(arrow_factory()));

    let placement = Pose {
        position: Vec3::new(3.0, 1.0, -2.0),
        parent: Some(ParentId(7)),
        world_space: false,
        ..Pose::NEUTRAL
    };
    let arrow = runtime.pools().rent::<Arrow>(placement).unwrap();
    assert!(arrow.active);
    assert_eq!(arrow.pose, placement);
    let serial = arrow.serial;

    assert!(runtime.pools().give_back(arrow).is_ok());
    assert_eq!(runtime.pools().available::<Arrow>(), Some(1));

    let again = runtime.pools().rent::<Arrow>(Pose::NEUTRAL).unwrap();
    assert_eq!(again.serial, serial);
    assert!(again.pose.is_neutral());
}

#[tokio::test]
async fn test_preload_uses_configured_threshold() {
    let config = RuntimeConfig {
        preload_threshold: 3,
        ..Default::default()
    };
    let mut runtime = Runtime::new(config);
    runtime.pools_mut().create_pool_with::<Arrow, _>(arrow_factory());

    let completed = Arc::new(AtomicUsize::new(0));
    let done = completed.clone();
    runtime
        .preload::<Arrow, _, _>(
            10,
            CancellationToken::new(),
            move |added| {
                done.store(added, Ordering::SeqCst);
            },
            |e| panic!("preload failed: {e}"),
        )
        .await;

    assert_eq!(completed.load(Ordering::SeqCst), 10);
    assert_eq!(runtime.pools().available::<Arrow>(), Some(10));
}

#[derive(Default)]
struct Climber {
    has_grip: bool,
}

macro_rules! climber_state {
    ($name:ident) => {
        #[derive(Default)]
        struct $name;

        impl State<Climber> for $name {
            fn ready_to_exit(&self, climber: &Climber) -> bool {
                climber.has_grip
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }
    };
}

climber_state!(Hanging);
climber_state!(Climbing);

#[test]
fn test_blocked_exit_leaves_queue_untouched() {
    let mut climber = Climber::default();
    let mut machine = StateController::new();
    machine.register_default_state::<Hanging>();
    machine.register_default_state::<Climbing>();
    machine.seed::<Hanging>(&mut climber).unwrap();

    machine.enqueue::<Climbing>().unwrap();
    machine.tick(&mut climber);
    assert_eq!(machine.current(), Some(StateKey::of::<Hanging>()));
    assert_eq!(machine.pending().count(), 1);

    climber.has_grip = true;
    machine.tick(&mut climber);
    assert_eq!(machine.current(), Some(StateKey::of::<Climbing>()));
    assert_eq!(machine.previous(), Some(StateKey::of::<Hanging>()));
}
