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

//! The demo character and its movement states.

use std::any::Any;
use tessera_sdk::prelude::*;

/// Stamina at or above which a resting wanderer gets back up.
pub const RESTED: u32 = 5;
/// Stamina needed to start sprinting.
pub const SPRINT_COST: u32 = 5;

/// The character driven by the demo state machine.
#[derive(Debug, Default)]
pub struct Wanderer {
    pub stamina: u32,
    pub distance: f32,
    pub steps: u32,
    /// Number of times the wanderer got back up.
    pub outings: u32,
}

impl Wanderer {
    /// Where the wanderer stands, walking along the x axis.
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.distance, 0.0, 0.0)
    }
}

#[derive(Default)]
pub struct Resting;

impl State<Wanderer> for Resting {
    fn ready_to_exit(&self, host: &Wanderer) -> bool {
        host.stamina >= RESTED
    }

    fn on_enter(&mut self, host: &mut Wanderer) {
        log::debug!("Wanderer: Sitting down after {:.0}m.", host.distance);
    }

    fn on_exit(&mut self, host: &mut Wanderer) {
        host.outings += 1;
    }

    fn update(&mut self, host: &mut Wanderer) {
        host.stamina += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
pub struct Walking;

impl State<Wanderer> for Walking {
    fn ready_to_enter(&self, host: &Wanderer) -> bool {
        host.stamina > 0
    }

    fn update(&mut self, host: &mut Wanderer) {
        host.stamina = host.stamina.saturating_sub(1);
        host.distance += 1.0;
        host.steps += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Counts how many sprints were started.
#[derive(Default)]
pub struct Sprinting {
    pub bursts: u32,
}

impl State<Wanderer> for Sprinting {
    fn ready_to_enter(&self, host: &Wanderer) -> bool {
        // Every other outing.
        host.stamina >= SPRINT_COST && host.outings % 2 == 0
    }

    fn on_enter(&mut self, _host: &mut Wanderer) {
        self.bursts += 1;
    }

    fn update(&mut self, host: &mut Wanderer) {
        host.stamina = host.stamina.saturating_sub(2);
        host.distance += 3.0;
        host.steps += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Builds the wanderer's controller with every state registered.
pub fn controller() -> StateController<Wanderer> {
    let mut machine = StateController::new();
    machine.register_default_state::<Resting>();
    machine.register_default_state::<Walking>();
    machine.register_default_state::<Sprinting>();
    machine
}

/// Proposes the next movement for this tick. Sprinting is preferred over
/// walking when both would be accepted. Nothing is proposed while an earlier
/// proposal is still waiting on the current state.
pub fn plan(machine: &mut StateController<Wanderer>, host: &Wanderer) -> Result<(), StateError> {
    if machine.pending().next().is_some() {
        return Ok(());
    }
    if machine.is_in::<Resting>() {
        machine.enqueue::<Sprinting>()?;
        machine.enqueue::<Walking>()?;
    } else if host.stamina == 0 {
        machine.enqueue::<Resting>()?;
    }
    Ok(())
}
