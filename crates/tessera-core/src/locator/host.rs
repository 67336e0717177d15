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

use std::fmt;

/// Identifier of a host container created for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u64);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// The host side of host-attached services.
///
/// Some services only make sense attached to a host object (something the
/// host updates, renders or destroys with a scene). When such a service is
/// built on demand, the locator asks the host for a fresh container named
/// after the service type.
pub trait ServiceHost: Send + Sync {
    /// Creates a named container and returns its id.
    fn spawn_container(&mut self, name: &str) -> ContainerId;
}

/// A host that only hands out ids. Used when no engine host is embedded.
#[derive(Debug, Default)]
pub struct DetachedHost {
    next: u64,
}

impl DetachedHost {
    /// Creates a host whose first container id is `0`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ServiceHost for DetachedHost {
    fn spawn_container(&mut self, name: &str) -> ContainerId {
        let id = ContainerId(self.next);
        self.next += 1;
        log::debug!("DetachedHost: Spawned {id} for '{name}'.");
        id
    }
}
