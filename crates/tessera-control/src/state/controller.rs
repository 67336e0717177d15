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

use super::{State, StateChanged, StateError, StateKey};
use std::any::{type_name, TypeId};
use std::collections::{HashMap, VecDeque};
use tessera_core::Signal;

type StateFactory<C> = Box<dyn Fn() -> anyhow::Result<Box<dyn State<C>>> + Send + Sync>;

/// What a call to [`StateController::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No state is current; nothing ran.
    Idle,
    /// The current state ran its phases without changing.
    Stayed(StateKey),
    /// A transition was committed and the new state ran its phases.
    Transitioned {
        /// The state that was exited.
        from: StateKey,
        /// The state that was entered.
        to: StateKey,
    },
}

/// Drives a host of type `C` through a set of [`State`]s.
///
/// The controller owns one instance per state type, built on first use from
/// its registered factory and cached afterwards.
pub struct StateController<C: 'static> {
    factories: HashMap<TypeId, StateFactory<C>>,
    states: HashMap<TypeId, Box<dyn State<C>>>,
    current: Option<StateKey>,
    previous: Option<StateKey>,
    queue: VecDeque<StateKey>,
    changed: Signal<StateChanged>,
}

impl<C: 'static> StateController<C> {
    /// Creates a controller with no states and no current state.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            states: HashMap::new(),
            current: None,
            previous: None,
            queue: VecDeque::new(),
            changed: Signal::new(),
        }
    }

    /// Registers how to build state `S`. Replaces any previous factory for `S`
    /// but leaves an already built instance in place.
    pub fn register_state<S, F>(&mut self, factory: F)
    where
        S: State<C>,
        F: Fn() -> anyhow::Result<S> + Send + Sync + 'static,
    {
        self.factories.insert(
            TypeId::of::<S>(),
            Box::new(move || -> anyhow::Result<Box<dyn State<C>>> {
                let state: Box<dyn State<C>> = Box::new(factory()?);
                Ok(state)
            }),
        );
    }

    /// Registers `S::default` as the factory for `S`.
    pub fn register_default_state<S>(&mut self)
    where
        S: State<C> + Default,
    {
        self.register_state::<S, _>(|| Ok(S::default()));
    }

    /// Returns the cached instance of `S`, building it on first access.
    pub fn get_state<S: State<C>>(&mut self) -> Result<&mut S, StateError> {
        let key = self.ensure::<S>()?;
        self.states
            .get_mut(&key.id())
            .and_then(|state| state.as_any_mut().downcast_mut::<S>())
            .ok_or(StateError::TypeMismatch {
                state: type_name::<S>(),
            })
    }

    /// Proposes a transition to `S`, arbitrated on the next [`tick`](Self::tick).
    pub fn enqueue<S: State<C>>(&mut self) -> Result<(), StateError> {
        let key = self.ensure::<S>()?;
        log::trace!("StateController: Enqueued transition to {key}.");
        self.queue.push_back(key);
        Ok(())
    }

    /// Makes `S` the current state immediately, bypassing the queue and the
    /// guards. Exits the current state first if there is one.
    pub fn seed<S: State<C>>(&mut self, host: &mut C) -> Result<(), StateError> {
        let key = self.ensure::<S>()?;
        match self.current {
            Some(from) => self.commit(from, key, host),
            None => {
                if let Some(state) = self.states.get_mut(&key.id()) {
                    state.on_enter(host);
                }
                self.current = Some(key);
                log::debug!("StateController: Seeded initial state {key}.");
            }
        }
        Ok(())
    }

    /// Runs one tick: arbitrates pending transitions, then runs the update
    /// phases of whichever state is current afterwards.
    pub fn tick(&mut self, host: &mut C) -> TickOutcome {
        let Some(current) = self.current else {
            return TickOutcome::Idle;
        };

        let can_exit = self
            .states
            .get(&current.id())
            .is_some_and(|state| state.ready_to_exit(host));
        if !can_exit || self.queue.is_empty() {
            self.run_phases(current, host);
            return TickOutcome::Stayed(current);
        }

        let mut accepted = None;
        while let Some(candidate) = self.queue.pop_front() {
            let ready = self
                .states
                .get(&candidate.id())
                .is_some_and(|state| state.ready_to_enter(host));
            if ready {
                accepted = Some(candidate);
                break;
            }
            log::trace!("StateController: {candidate} refused entry.");
        }
        self.queue.clear();

        match accepted {
            Some(next) => {
                self.commit(current, next, host);
                self.run_phases(next, host);
                TickOutcome::Transitioned {
                    from: current,
                    to: next,
                }
            }
            None => {
                self.run_phases(current, host);
                TickOutcome::Stayed(current)
            }
        }
    }

    /// The current state, if one has been seeded.
    pub fn current(&self) -> Option<StateKey> {
        self.current
    }

    /// The state exited by the most recent transition.
    pub fn previous(&self) -> Option<StateKey> {
        self.previous
    }

    /// Returns `true` if `S` is the current state.
    pub fn is_in<S: 'static>(&self) -> bool {
        self.current.is_some_and(|key| key.is::<S>())
    }

    /// Transitions waiting for the next tick, in arbitration order.
    pub fn pending(&self) -> impl Iterator<Item = StateKey> + '_ {
        self.queue.iter().copied()
    }

    /// Notified after every committed transition.
    pub fn on_state_changed(&self) -> &Signal<StateChanged> {
        &self.changed
    }

    fn ensure<S: State<C>>(&mut self) -> Result<StateKey, StateError> {
        let key = StateKey::of::<S>();
        if self.states.contains_key(&key.id()) {
            return Ok(key);
        }
        let factory = self
            .factories
            .get(&key.id())
            .ok_or(StateError::NoFactory { state: key.name() })?;
        let state = factory().map_err(|source| StateError::Construction {
            state: key.name(),
            source,
        })?;
        log::debug!("StateController: Built state {key}.");
        self.states.insert(key.id(), state);
        Ok(key)
    }

    fn commit(&mut self, from: StateKey, to: StateKey, host: &mut C) {
        if let Some(state) = self.states.get_mut(&from.id()) {
            state.on_exit(host);
        }
        self.previous = Some(from);
        self.current = Some(to);
        if let Some(state) = self.states.get_mut(&to.id()) {
            state.on_enter(host);
        }
        log::debug!("StateController: {from} -> {to}.");
        self.changed.dispatch(StateChanged {
            previous: from,
            current: to,
        });
    }

    fn run_phases(&mut self, key: StateKey, host: &mut C) {
        if let Some(state) = self.states.get_mut(&key.id()) {
            state.pre_update(host);
            state.update(host);
            state.fixed_update(host);
            state.post_update(host);
        }
    }
}

impl<C: 'static> Default for StateController<C> {
    fn default() -> Self {
        Self::new()
    }
}
