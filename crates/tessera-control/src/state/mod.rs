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

//! # Cooperative State Machine
//!
//! A [`StateController`] drives one host value (a character, an AI agent, a
//! menu flow) through states implementing [`State`]. Game logic proposes
//! transitions with [`StateController::enqueue`]; once per tick the controller
//! arbitrates the queue against the states' guards.
//!
//! ## Tick
//!
//! ```text
//! no current state          -> nothing
//! !current.ready_to_exit    -> run current phases
//! queue empty               -> run current phases
//! first queued ready_to_enter -> exit current, enter it, notify, run its phases
//! none ready                -> run current phases
//! ```
//!
//! Whatever the outcome of an arbitration, the queue is empty afterwards.
//! Phases run in order: `pre_update`, `update`, `fixed_update`, `post_update`.

mod controller;

pub use self::controller::{StateController, TickOutcome};

use std::any::{type_name, Any, TypeId};
use std::fmt;

/// A state of a [`StateController`] driving a host of type `C`.
///
/// States are built lazily, once per controller, and kept for the
/// controller's lifetime, so they may carry data between activations.
pub trait State<C>: Any + Send {
    /// Human-readable name, used in logs and notifications.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Whether the host may leave this state now.
    fn ready_to_exit(&self, _host: &C) -> bool {
        true
    }

    /// Whether the host may enter this state now.
    fn ready_to_enter(&self, _host: &C) -> bool {
        true
    }

    /// Called when this state becomes current.
    fn on_enter(&mut self, _host: &mut C) {}

    /// Called when this state stops being current.
    fn on_exit(&mut self, _host: &mut C) {}

    /// First update phase of a tick.
    fn pre_update(&mut self, _host: &mut C) {}

    /// Main update phase of a tick.
    fn update(&mut self, _host: &mut C) {}

    /// Fixed-step update phase of a tick.
    fn fixed_update(&mut self, _host: &mut C) {}

    /// Last update phase of a tick.
    fn post_update(&mut self, _host: &mut C) {}

    /// Downcast to a concrete state type.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to a concrete state type (mutable).
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Identity of a state type within a controller.
#[derive(Debug, Clone, Copy, Eq)]
pub struct StateKey {
    id: TypeId,
    name: &'static str,
}

impl StateKey {
    /// The key of state type `S`.
    pub fn of<S: 'static>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: type_name::<S>(),
        }
    }

    /// Returns `true` if this key identifies `S`.
    pub fn is<S: 'static>(&self) -> bool {
        self.id == TypeId::of::<S>()
    }

    /// Type name of the state.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for StateKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::hash::Hash for StateKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.name.rsplit("::").next().unwrap_or(self.name);
        write!(f, "{short}")
    }
}

/// Payload of [`StateController::on_state_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChanged {
    /// The state that was exited.
    pub previous: StateKey,
    /// The state that was entered.
    pub current: StateKey,
}

/// Error type for state lookups and construction.
#[derive(Debug)]
pub enum StateError {
    /// No factory is registered for the state type.
    NoFactory {
        /// Type name of the state.
        state: &'static str,
    },
    /// The state's factory failed.
    Construction {
        /// Type name of the state.
        state: &'static str,
        /// The factory's error.
        source: anyhow::Error,
    },
    /// The cached state is not of the requested type.
    TypeMismatch {
        /// Type name of the requested state.
        state: &'static str,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::NoFactory { state } => write!(f, "No factory registered for state '{state}'"),
            StateError::Construction { state, source } => {
                write!(f, "Failed to construct state '{state}': {source:#}")
            }
            StateError::TypeMismatch { state } => {
                write!(f, "Cached state does not match requested type '{state}'")
            }
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StateError::Construction { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
