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

//! Process-wide service lookup without static storage.
//!
//! The [`ServiceLocator`] maps a concrete service type to its single instance
//! and builds the instance on first access. The [`KeyedLocator`] covers the
//! cases where one type has several instances told apart by a composite key
//! (a camera per scene and role, a blueprint per id, ...).
//!
//! Both follow the same rule for explicit registration: the first writer wins
//! and later `set` calls are silently ignored.

mod capabilities;
mod host;
mod keyed;
mod service;

pub use self::capabilities::Capabilities;
pub use self::host::{ContainerId, DetachedHost, ServiceHost};
pub use self::keyed::KeyedLocator;
pub use self::service::{Service, ServiceKind, ServiceLocator};
