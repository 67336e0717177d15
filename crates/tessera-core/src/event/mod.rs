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

//! Event primitives for decoupled, in-process notification.
//!
//! A [`Signal`] is a single event channel with a persistent and a one-shot
//! listener chain. A [`SignalBus`] keeps one signal per event type so game
//! code can publish and subscribe by type without holding the signal itself.
//!
//! Listener failures never escape a dispatch. They are logged, counted in the
//! returned [`DispatchReport`] and forwarded to an optional [`FailureSink`].

mod bus;
mod failure;
mod signal;

pub use self::bus::SignalBus;
pub use self::failure::{FailureSink, ListenerFailure, ListenerKind};
pub use self::signal::{listener, DispatchReport, Listener, Signal};
