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

//! Scoped dependency contexts.
//!
//! A [`Context`] is a named scope (global, session, activity, ...) owning its
//! own [`TypedRegistry`]. The same contract can be bound differently in each
//! scope. The [`ContextRegistry`] creates contexts on first lookup and
//! disposes them when they are stopped.

use crate::registry::{FactoryTable, RegistryError, TypedRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tessera_core::liveness::LivenessProbe;

/// Identifier of a [`Context`] within a [`ContextRegistry`].
///
/// Game code usually defines an enum of scopes and implements
/// `From<Scope> for ContextId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u32);

impl ContextId {
    /// Lives for the whole process.
    pub const GLOBAL: Self = Self(0);
    /// Lives for one play session.
    pub const SESSION: Self = Self(1);
    /// Lives for one activity (a level, a menu, ...).
    pub const ACTIVITY: Self = Self(2);
}

impl From<u32> for ContextId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ContextId::GLOBAL => write!(f, "Global"),
            ContextId::SESSION => write!(f, "Session"),
            ContextId::ACTIVITY => write!(f, "Activity"),
            ContextId(other) => write!(f, "Context({other})"),
        }
    }
}

/// A dependency scope owning exactly one [`TypedRegistry`].
#[derive(Debug)]
pub struct Context {
    id: ContextId,
    registry: TypedRegistry,
    factories: Arc<FactoryTable>,
}

impl Context {
    /// Creates an empty context with no factories.
    pub fn new(id: ContextId) -> Self {
        Self::with_factories(id, Arc::new(FactoryTable::new()))
    }

    /// Creates an empty context that builds missing dependencies through `factories`.
    pub fn with_factories(id: ContextId, factories: Arc<FactoryTable>) -> Self {
        Self {
            id,
            registry: TypedRegistry::new(),
            factories,
        }
    }

    /// This context's id.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Binds `target` to contract `C` in this context.
    pub fn register<C: ?Sized + Send + Sync + 'static>(
        &mut self,
        target: Arc<C>,
    ) -> Result<(), RegistryError> {
        self.registry.register(target)
    }

    /// Binds a host-owned `target` to contract `C` in this context.
    pub fn register_host<C: ?Sized + Send + Sync + 'static>(
        &mut self,
        target: Arc<C>,
        probe: LivenessProbe,
    ) -> Result<(), RegistryError> {
        self.registry.register_host(target, probe)
    }

    /// Removes every binding of `instance` in this context.
    pub fn unregister<T: ?Sized>(&mut self, instance: &Arc<T>) -> usize {
        self.registry.unregister(instance)
    }

    /// Returns the live implementation of `C`, if bound.
    pub fn try_get<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.registry.try_get::<C>()
    }

    /// Returns the live implementation of `C`, building it on a miss.
    pub fn get<C: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<C>, RegistryError> {
        self.registry.get::<C>(&self.factories)
    }

    /// Read access to the underlying registry.
    pub fn registry(&self) -> &TypedRegistry {
        &self.registry
    }

    /// Write access to the underlying registry.
    pub fn registry_mut(&mut self) -> &mut TypedRegistry {
        &mut self.registry
    }

    /// Releases every binding. Called when the context is stopped.
    pub fn dispose(&mut self) {
        log::debug!(
            "Context {}: Disposing {} binding(s).",
            self.id,
            self.registry.len()
        );
        self.registry.clear();
    }
}

/// All live contexts of a runtime, keyed by [`ContextId`].
///
/// Lookups never fail: an unknown id gets a fresh, empty context.
#[derive(Debug)]
pub struct ContextRegistry {
    contexts: HashMap<ContextId, Context>,
    factories: Arc<FactoryTable>,
}

impl ContextRegistry {
    /// Creates a registry whose contexts share `factories`.
    pub fn new(factories: FactoryTable) -> Self {
        Self {
            contexts: HashMap::new(),
            factories: Arc::new(factories),
        }
    }

    /// Returns the context for `id`, creating it if needed.
    pub fn get_or_create(&mut self, id: impl Into<ContextId>) -> &mut Context {
        let id = id.into();
        let factories = &self.factories;
        self.contexts.entry(id).or_insert_with(|| {
            log::info!("ContextRegistry: Created context {id}.");
            Context::with_factories(id, Arc::clone(factories))
        })
    }

    /// Returns the context for `id` without creating it.
    pub fn get(&self, id: impl Into<ContextId>) -> Option<&Context> {
        self.contexts.get(&id.into())
    }

    /// Returns the context for `id` mutably without creating it.
    pub fn get_mut(&mut self, id: impl Into<ContextId>) -> Option<&mut Context> {
        self.contexts.get_mut(&id.into())
    }

    /// Returns `true` if a context exists for `id`.
    pub fn contains(&self, id: impl Into<ContextId>) -> bool {
        self.contexts.contains_key(&id.into())
    }

    /// Disposes the context for `id` and forgets it.
    ///
    /// Returns `false` if no such context existed.
    pub fn stop(&mut self, id: impl Into<ContextId>) -> bool {
        let id = id.into();
        match self.contexts.remove(&id) {
            Some(mut context) => {
                context.dispose();
                log::info!("ContextRegistry: Stopped context {id}.");
                true
            }
            None => false,
        }
    }

    /// Stops every context.
    pub fn stop_all(&mut self) {
        for id in self.ids() {
            self.stop(id);
        }
    }

    /// Ids of the live contexts, sorted.
    pub fn ids(&self) -> Vec<ContextId> {
        let mut ids: Vec<_> = self.contexts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The factory table shared by every context.
    pub fn factories(&self) -> &FactoryTable {
        &self.factories
    }

    /// Number of live contexts.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Returns `true` if no context is live.
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new(FactoryTable::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Inventory {
        slots: u32,
    }

    #[derive(Clone, Copy)]
    enum Scope {
        Level,
    }

    impl From<Scope> for ContextId {
        fn from(scope: Scope) -> Self {
            match scope {
                Scope::Level => ContextId(10),
            }
        }
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut contexts = ContextRegistry::default();
        contexts
            .get_or_create(ContextId::GLOBAL)
            .register(Arc::new(Inventory { slots: 4 }))
            .unwrap();
        let again = contexts.get_or_create(ContextId::GLOBAL);
        assert_eq!(again.try_get::<Inventory>().unwrap().slots, 4);
        assert_eq!(contexts.len(), 1);
    }

    #[test]
    fn test_contexts_are_isolated() {
        let mut contexts = ContextRegistry::default();
        contexts
            .get_or_create(1u32)
            .register(Arc::new(Inventory { slots: 1 }))
            .unwrap();
        assert!(contexts.get_or_create(2u32).try_get::<Inventory>().is_none());

        // Same contract, different binding per context.
        contexts
            .get_or_create(2u32)
            .register(Arc::new(Inventory { slots: 2 }))
            .unwrap();
        assert_eq!(contexts.get(1u32).unwrap().try_get::<Inventory>().unwrap().slots, 1);
        assert_eq!(contexts.get(2u32).unwrap().try_get::<Inventory>().unwrap().slots, 2);
    }

    #[test]
    fn test_stop_disposes_and_removes() {
        let mut contexts = ContextRegistry::default();
        let inventory = Arc::new(Inventory::default());
        contexts
            .get_or_create(Scope::Level)
            .register(Arc::clone(&inventory))
            .unwrap();
        assert_eq!(Arc::strong_count(&inventory), 2);

        assert!(contexts.stop(Scope::Level));
        assert!(!contexts.contains(Scope::Level));
        assert_eq!(Arc::strong_count(&inventory), 1);
        assert!(!contexts.stop(Scope::Level));

        // A later lookup starts from scratch.
        assert!(contexts
            .get_or_create(Scope::Level)
            .try_get::<Inventory>()
            .is_none());
    }

    #[test]
    fn test_shared_factories_build_per_context() {
        let mut factories = FactoryTable::new();
        factories.register_default::<Inventory>();
        let mut contexts = ContextRegistry::new(factories);

        let a = contexts.get_or_create(ContextId::SESSION).get::<Inventory>().unwrap();
        let b = contexts.get_or_create(ContextId::ACTIVITY).get::<Inventory>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(contexts.factories().contains::<Inventory>());
    }

    #[test]
    fn test_stop_all_and_ids() {
        let mut contexts = ContextRegistry::default();
        contexts.get_or_create(ContextId::ACTIVITY);
        contexts.get_or_create(ContextId::GLOBAL);
        assert_eq!(contexts.ids(), vec![ContextId::GLOBAL, ContextId::ACTIVITY]);

        contexts.stop_all();
        assert!(contexts.is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(ContextId::GLOBAL.to_string(), "Global");
        assert_eq!(ContextId(42).to_string(), "Context(42)");
    }
}
