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

//! Contract-to-implementation registries.
//!
//! A [`TypedRegistry`] binds each contract type to at most one live
//! implementation. Contracts are ordinary Rust types, trait objects included,
//! so `dyn AudioOutput` can be bound to whatever concrete mixer the host built.

mod entry;
mod error;
mod factory;

pub use self::entry::RegisteredEntry;
pub use self::error::RegistryError;
pub use self::factory::FactoryTable;

use self::entry::address_of;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tessera_core::liveness::{Liveness, LivenessProbe};

/// Maps a contract type to exactly one live implementation.
///
/// Entries hold their target through an `Arc`. A [`register`](Self::register)
/// entry co-owns a plain value and stays alive until it is unregistered, even
/// after every other handle is dropped; factory-built entries rely on this.
/// Only [`register_host`](Self::register_host) entries can die on their own.
/// Dead entries (targets destroyed by their owner) read as absent but stay in
/// the map until they are unregistered, replaced or purged.
#[derive(Debug, Default)]
pub struct TypedRegistry {
    entries: HashMap<TypeId, RegisteredEntry>,
}

impl TypedRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `target` to contract `C`.
    ///
    /// Fails with [`RegistryError::Duplicate`] if a live implementation is
    /// already bound; the existing binding is kept. A dead binding is replaced.
    /// The registry keeps `target` alive until it is unregistered.
    pub fn register<C: ?Sized + Send + Sync + 'static>(
        &mut self,
        target: Arc<C>,
    ) -> Result<(), RegistryError> {
        self.insert(target, Liveness::Plain)
    }

    /// Binds a host-owned `target` to contract `C`, tracked through `probe`.
    ///
    /// The binding reads as absent as soon as the probe reports the target
    /// dead, whoever still holds an `Arc` to it.
    pub fn register_host<C: ?Sized + Send + Sync + 'static>(
        &mut self,
        target: Arc<C>,
        probe: LivenessProbe,
    ) -> Result<(), RegistryError> {
        self.insert(target, Liveness::Host(probe))
    }

    fn insert<C: ?Sized + Send + Sync + 'static>(
        &mut self,
        target: Arc<C>,
        liveness: Liveness,
    ) -> Result<(), RegistryError> {
        let key = TypeId::of::<C>();
        if let Some(existing) = self.entries.get(&key) {
            if existing.is_alive() {
                log::warn!(
                    "TypedRegistry: '{}' is already registered, rejecting the new binding.",
                    type_name::<C>()
                );
                return Err(RegistryError::Duplicate {
                    contract: type_name::<C>(),
                });
            }
            log::debug!(
                "TypedRegistry: Replacing dead binding for '{}'.",
                type_name::<C>()
            );
        }
        self.entries
            .insert(key, RegisteredEntry::new(target, liveness));
        Ok(())
    }

    /// Returns the live implementation of `C`.
    ///
    /// A dead binding is reported as absent but is not removed.
    pub fn try_get<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.entries
            .get(&TypeId::of::<C>())
            .filter(|entry| entry.is_alive())
            .and_then(|entry| entry.target::<C>())
    }

    /// Returns the live implementation of `C`, building one through
    /// `factories` on a miss.
    ///
    /// The built value is registered before it is returned. Without a
    /// constructor the lookup fails with [`RegistryError::NotFound`].
    pub fn get<C: ?Sized + Send + Sync + 'static>(
        &mut self,
        factories: &FactoryTable,
    ) -> Result<Arc<C>, RegistryError> {
        if let Some(found) = self.try_get::<C>() {
            return Ok(found);
        }
        let Some(built) = factories.build::<C>() else {
            log::warn!("TypedRegistry: No dependency and no factory for '{}'.", type_name::<C>());
            return Err(RegistryError::NotFound {
                contract: type_name::<C>(),
            });
        };
        log::debug!("TypedRegistry: Built '{}' on demand.", type_name::<C>());
        self.register(Arc::clone(&built))?;
        Ok(built)
    }

    /// Returns `true` if a live implementation of `C` is bound.
    pub fn contains<C: ?Sized + 'static>(&self) -> bool {
        self.entries
            .get(&TypeId::of::<C>())
            .is_some_and(RegisteredEntry::is_alive)
    }

    /// Removes every binding whose target is `instance`.
    ///
    /// The same object may be bound to several contracts; all of them go.
    /// Returns how many bindings were removed, which may be zero.
    pub fn unregister<T: ?Sized>(&mut self, instance: &Arc<T>) -> usize {
        let address = address_of(instance);
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.points_to(address));
        before - self.entries.len()
    }

    /// Removes every binding whose target is dead. Returns how many were removed.
    pub fn purge_dead(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_alive());
        before - self.entries.len()
    }

    /// Iterates over every binding, dead ones included.
    pub fn entries(&self) -> impl Iterator<Item = &RegisteredEntry> {
        self.entries.values()
    }

    /// Number of bindings, dead ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every binding. Targets are not destroyed, only released.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::liveness::Lifeline;

    trait AudioOutput: Send + Sync {
        fn volume(&self) -> f32;
    }

    #[derive(Default)]
    struct Mixer {
        volume: f32,
    }

    impl AudioOutput for Mixer {
        fn volume(&self) -> f32 {
            self.volume
        }
    }

    #[test]
    fn test_register_and_get_trait_contract() {
        let mut registry = TypedRegistry::new();
        let mixer: Arc<dyn AudioOutput> = Arc::new(Mixer { volume: 0.5 });
        registry.register(mixer).unwrap();

        let found = registry.try_get::<dyn AudioOutput>().unwrap();
        assert_eq!(found.volume(), 0.5);
        assert!(registry.try_get::<Mixer>().is_none());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = TypedRegistry::new();
        registry.register(Arc::new(Mixer { volume: 1.0 })).unwrap();
        let err = registry
            .register(Arc::new(Mixer { volume: 0.2 }))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
        assert_eq!(registry.try_get::<Mixer>().unwrap().volume, 1.0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_dead_target_reads_as_absent_until_unregistered() {
        let mut registry = TypedRegistry::new();
        let lifeline = Lifeline::new();
        let mixer = Arc::new(Mixer { volume: 0.3 });
        registry
            .register_host(Arc::clone(&mixer), lifeline.probe())
            .unwrap();
        assert!(registry.contains::<Mixer>());

        lifeline.destroy();
        assert!(registry.try_get::<Mixer>().is_none());
        assert!(!registry.contains::<Mixer>());
        // The stale entry is still held.
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.unregister(&mixer), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_plain_binding_outlives_creator_handle() {
        let mut registry = TypedRegistry::new();
        let mixer = Arc::new(Mixer { volume: 0.8 });
        registry.register(Arc::clone(&mixer)).unwrap();
        drop(mixer);

        let found = registry.try_get::<Mixer>().unwrap();
        assert_eq!(found.volume, 0.8);
        assert!(registry.entries().all(RegisteredEntry::is_alive));
        assert_eq!(registry.unregister(&found), 1);
        assert!(registry.try_get::<Mixer>().is_none());
    }

    #[test]
    fn test_host_binding_dies_with_its_lifeline() {
        let mut registry = TypedRegistry::new();
        let mixer = Arc::new(Mixer { volume: 0.1 });
        {
            let lifeline = Lifeline::new();
            registry
                .register_host(Arc::clone(&mixer), lifeline.probe())
                .unwrap();
            assert!(registry.contains::<Mixer>());
        }
        // The registry and `mixer` still hold the value, but its owner is gone.
        assert!(registry.try_get::<Mixer>().is_none());
        assert_eq!(registry.purge_dead(), 1);
    }

    #[test]
    fn test_dead_binding_can_be_replaced() {
        let mut registry = TypedRegistry::new();
        let lifeline = Lifeline::new();
        registry
            .register_host(Arc::new(Mixer { volume: 0.1 }), lifeline.probe())
            .unwrap();
        lifeline.destroy();

        registry.register(Arc::new(Mixer { volume: 0.9 })).unwrap();
        assert_eq!(registry.try_get::<Mixer>().unwrap().volume, 0.9);
    }

    #[test]
    fn test_unregister_removes_every_contract_of_instance() {
        let mut registry = TypedRegistry::new();
        let mixer = Arc::new(Mixer { volume: 0.7 });
        registry.register(Arc::clone(&mixer)).unwrap();
        registry
            .register(Arc::clone(&mixer) as Arc<dyn AudioOutput>)
            .unwrap();
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.unregister(&mixer), 2);
        assert!(registry.is_empty());
        // Unknown instance is a no-op.
        assert_eq!(registry.unregister(&mixer), 0);
    }

    #[test]
    fn test_get_builds_through_factory() {
        let mut factories = FactoryTable::new();
        factories.register_default::<Mixer>();
        let mut registry = TypedRegistry::new();

        let built = registry.get::<Mixer>(&factories).unwrap();
        let again = registry.get::<Mixer>(&factories).unwrap();
        assert!(Arc::ptr_eq(&built, &again));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_without_factory_is_not_found() {
        let mut registry = TypedRegistry::new();
        let result = registry.get::<dyn AudioOutput>(&FactoryTable::new());
        assert!(matches!(result, Err(RegistryError::NotFound { .. })));
    }

    #[test]
    fn test_purge_dead() {
        let mut registry = TypedRegistry::new();
        let lifeline = Lifeline::new();
        registry
            .register_host(Arc::new(Mixer::default()), lifeline.probe())
            .unwrap();
        registry
            .register(Arc::new(Mixer::default()) as Arc<dyn AudioOutput>)
            .unwrap();
        drop(lifeline);

        assert_eq!(registry.purge_dead(), 1);
        assert_eq!(registry.len(), 1);
    }
}
