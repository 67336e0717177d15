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

use crate::liveness::{Liveness, LivenessProbe};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

struct KeyedEntry<V: ?Sized> {
    value: Arc<V>,
    liveness: Liveness,
}

/// A locator keyed by a composite key instead of a bare type.
///
/// Typical keys are tuples such as `(SceneId, CameraRole)`. Lookups follow the
/// same contracts as [`ServiceLocator`](super::ServiceLocator): `get` returns
/// nothing rather than failing, and `set` only fills empty (or dead) slots.
pub struct KeyedLocator<K, V: ?Sized> {
    entries: HashMap<K, KeyedEntry<V>>,
}

impl<K: Eq + Hash + fmt::Debug, V: ?Sized> KeyedLocator<K, V> {
    /// Creates an empty locator.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the live value stored under `key`.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries
            .get(key)
            .filter(|entry| entry.liveness.is_alive())
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Stores a plain value under `key` if the slot is empty.
    pub fn set(&mut self, key: K, value: Arc<V>) -> bool {
        self.set_with(key, value, Liveness::Plain)
    }

    /// Stores a host-owned value under `key` if the slot is empty.
    pub fn set_host(&mut self, key: K, value: Arc<V>, probe: LivenessProbe) -> bool {
        self.set_with(key, value, Liveness::Host(probe))
    }

    fn set_with(&mut self, key: K, value: Arc<V>, liveness: Liveness) -> bool {
        if let Some(existing) = self.entries.get(&key) {
            if existing.liveness.is_alive() {
                log::debug!("KeyedLocator: {key:?} already set, ignoring.");
                return false;
            }
            log::debug!("KeyedLocator: Replacing dead entry for {key:?}.");
        }
        self.entries.insert(key, KeyedEntry { value, liveness });
        true
    }

    /// Removes and returns the value under `key`, dead or alive.
    pub fn remove(&mut self, key: &K) -> Option<Arc<V>> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Number of slots, including dead ones not yet replaced.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no slot is used.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the locator.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Eq + Hash + fmt::Debug, V: ?Sized> Default for KeyedLocator<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V: ?Sized> fmt::Debug for KeyedLocator<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLocator")
            .field("entries", &self.entries.len())
            .finish()
    }
}
