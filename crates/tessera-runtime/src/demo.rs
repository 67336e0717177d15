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

//! The demo scene: one wanderer leaving pooled footprints, a clock
//! service, a session scoreboard and a banner owned by the activity.

use crate::wanderer::{self, Resting, Sprinting, Wanderer};
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tessera_sdk::prelude::*;
use tokio_util::sync::CancellationToken;

/// Footprints kept on the ground before the oldest is recycled.
const TRAIL_LENGTH: usize = 4;
/// Footprints built ahead of the first tick.
const PRELOADED_FOOTPRINTS: usize = 8;
/// Tick at which the activity banner is torn down by its owner.
const BANNER_LIFETIME: u32 = 10;

/// Published once per tick, before the state machine runs.
#[derive(Debug, Clone, Copy)]
pub struct TickStarted(pub u32);

/// Anything advanced by the scene clock.
pub trait Tickable: Send + Sync {
    fn advance(&self);
}

/// Process-wide frame counter.
#[derive(Default)]
pub struct Clock {
    frames: AtomicU64,
}

impl Clock {
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

impl Tickable for Clock {
    fn advance(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }
}

impl Service for Clock {
    fn create() -> Self {
        Clock::default()
    }

    fn kind() -> ServiceKind {
        ServiceKind::HostAttached
    }

    fn capabilities(this: &Arc<Self>, caps: &mut Capabilities) {
        caps.add::<dyn Tickable>(Arc::clone(this) as Arc<dyn Tickable>);
    }
}

/// Per-session statistics.
pub trait Scoreboard: Send + Sync {
    fn record_step(&self);
    fn steps(&self) -> u64;
}

#[derive(Default)]
struct Tally {
    steps: AtomicU64,
}

impl Scoreboard for Tally {
    fn record_step(&self) {
        self.steps.fetch_add(1, Ordering::Relaxed);
    }

    fn steps(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }
}

/// A message shown while the current activity lasts.
pub trait Banner: Send + Sync {
    fn text(&self) -> &str;
}

struct Welcome;

impl Banner for Welcome {
    fn text(&self) -> &str {
        "Welcome to the meadow"
    }
}

/// A pooled decal dropped behind the wanderer.
#[derive(Debug, Clone)]
pub struct Footprint {
    pose: Pose,
    visible: bool,
}

impl Poolable for Footprint {
    fn pose(&self) -> &Pose {
        &self.pose
    }

    fn pose_mut(&mut self) -> &mut Pose {
        &mut self.pose
    }

    fn set_active(&mut self, active: bool) {
        self.visible = active;
    }
}

pub struct Scene {
    machine: StateController<Wanderer>,
    wanderer: Wanderer,
    trail: VecDeque<Footprint>,
    banner_owner: Lifeline,
    tick: u32,
    last_steps: u32,
}

impl Scene {
    /// Wires every subsystem of `runtime` and preloads the footprint pool.
    pub async fn setup(runtime: &mut Runtime) -> Result<Self> {
        runtime.services_mut().get::<Clock>();

        runtime
            .context(ContextId::SESSION)
            .register::<dyn Scoreboard>(Arc::new(Tally::default()))?;

        let banner_owner = Lifeline::new();
        runtime
            .context(ContextId::ACTIVITY)
            .register_host::<dyn Banner>(Arc::new(Welcome), banner_owner.probe())?;

        runtime.pools_mut().create_pool(Footprint {
            pose: Pose::NEUTRAL,
            visible: false,
        });
        runtime
            .preload::<Footprint, _, _>(
                PRELOADED_FOOTPRINTS,
                CancellationToken::new(),
                |added| log::info!("Scene: Preloaded {added} footprints."),
                |e| log::error!("Scene: Footprint preload failed: {e}"),
            )
            .await;

        let greeting = listener(|tick: &TickStarted| {
            log::info!("Scene: First tick is #{}.", tick.0);
            Ok(())
        });
        runtime.signals_mut().subscribe_once(&greeting);
        let chatter = listener(|tick: &TickStarted| {
            log::trace!("Scene: Tick #{}.", tick.0);
            Ok(())
        });
        runtime.signals_mut().subscribe(&chatter);

        let mut machine = wanderer::controller();
        machine
            .on_state_changed()
            .subscribe(&listener(|change: &StateChanged| {
                log::info!("Scene: Wanderer {} -> {}.", change.previous, change.current);
                Ok(())
            }));

        let mut wanderer = Wanderer::default();
        machine.seed::<Resting>(&mut wanderer)?;

        Ok(Self {
            machine,
            wanderer,
            trail: VecDeque::with_capacity(TRAIL_LENGTH),
            banner_owner,
            tick: 0,
            last_steps: 0,
        })
    }

    /// Advances the scene by one tick.
    pub fn tick(&mut self, runtime: &mut Runtime) -> Result<()> {
        self.tick += 1;
        runtime.signals().dispatch(TickStarted(self.tick));
        for tickable in runtime.services().get_all::<dyn Tickable>() {
            tickable.advance();
        }

        wanderer::plan(&mut self.machine, &self.wanderer)?;
        self.machine.tick(&mut self.wanderer);

        if self.wanderer.steps > self.last_steps {
            self.last_steps = self.wanderer.steps;
            self.leave_footprint(runtime);
            if let Some(board) = runtime.context(ContextId::SESSION).try_get::<dyn Scoreboard>() {
                board.record_step();
            }
        }

        if self.tick == BANNER_LIFETIME {
            self.banner_owner.destroy();
        }
        match runtime.context(ContextId::ACTIVITY).try_get::<dyn Banner>() {
            Some(banner) => log::trace!("Scene: Banner '{}'.", banner.text()),
            None if self.tick == BANNER_LIFETIME => {
                log::info!("Scene: Activity banner is gone.");
            }
            None => {}
        }
        Ok(())
    }

    fn leave_footprint(&mut self, runtime: &Runtime) {
        if self.trail.len() == TRAIL_LENGTH {
            if let Some(oldest) = self.trail.pop_front() {
                if runtime.pools().give_back(oldest).is_err() {
                    log::warn!("Scene: Footprint pool disappeared.");
                }
            }
        }
        let placement = Pose {
            position: self.wanderer.position(),
            ..Pose::NEUTRAL
        };
        if let Some(footprint) = runtime.pools().rent::<Footprint>(placement) {
            self.trail.push_back(footprint);
        }
    }

    /// Logs a summary of the run.
    pub fn report(&mut self, runtime: &mut Runtime) {
        let frames = runtime
            .services()
            .try_get::<Clock>()
            .map_or(0, |clock| clock.frames());
        let recorded = runtime
            .context(ContextId::SESSION)
            .try_get::<dyn Scoreboard>()
            .map_or(0, |board| board.steps());
        let bursts = self
            .machine
            .get_state::<Sprinting>()
            .map_or(0, |sprint| sprint.bursts);
        log::info!("--- Scene Summary ---");
        log::info!("  Frames: {frames}");
        log::info!(
            "  Distance: {:.0}m in {} steps ({recorded} recorded), {bursts} sprint(s)",
            self.wanderer.distance,
            self.wanderer.steps
        );
        log::info!(
            "  Footprints: {} on the ground, {} pooled",
            self.trail.len(),
            runtime.pools().available::<Footprint>().unwrap_or(0)
        );
        log::info!("  Listener failures: {}", runtime.failures().total());
        log::info!("---------------------");
    }
}
