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

//! # Tessera Core
//!
//! Foundational runtime primitives shared by every other tessera crate:
//! liveness tracking for host-owned objects, spatial poses, signals and the
//! service locator.

#![warn(missing_docs)]

pub mod event;
pub mod liveness;
pub mod locator;
pub mod spatial;

pub use event::{Signal, SignalBus};
pub use liveness::{Lifeline, Liveness, LivenessProbe};
pub use locator::{KeyedLocator, Service, ServiceLocator};
