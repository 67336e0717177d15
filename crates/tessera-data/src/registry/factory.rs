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

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Builder = Box<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// Constructors for contracts, registered once at startup.
///
/// When a lookup misses, registries build the missing dependency through
/// this table instead of guessing how to construct it.
#[derive(Default)]
pub struct FactoryTable {
    builders: HashMap<TypeId, (&'static str, Builder)>,
}

impl FactoryTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor for contract `C`, replacing any previous one.
    pub fn register<C, F>(&mut self, factory: F)
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<C> + Send + Sync + 'static,
    {
        let builder: Builder =
            Box::new(move || -> Box<dyn Any + Send + Sync> { Box::new(factory()) });
        self.builders
            .insert(TypeId::of::<C>(), (type_name::<C>(), builder));
    }

    /// Registers `T::default()` as the constructor for `T`.
    pub fn register_default<T: Default + Send + Sync + 'static>(&mut self) {
        self.register::<T, _>(|| Arc::new(T::default()));
    }

    /// Builds a fresh `C`, or `None` if no constructor is registered.
    pub fn build<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        let (_, builder) = self.builders.get(&TypeId::of::<C>())?;
        builder().downcast::<Arc<C>>().ok().map(|boxed| *boxed)
    }

    /// Returns `true` if `C` has a constructor.
    pub fn contains<C: ?Sized + 'static>(&self) -> bool {
        self.builders.contains_key(&TypeId::of::<C>())
    }

    /// Number of registered constructors.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Returns `true` if no constructor is registered.
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.builders.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("FactoryTable").field("contracts", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Default)]
    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_build_trait_contract() {
        let mut table = FactoryTable::new();
        table.register::<dyn Greeter, _>(|| Arc::new(English) as Arc<dyn Greeter>);
        let built = table.build::<dyn Greeter>().unwrap();
        assert_eq!(built.greet(), "hello");
    }

    #[test]
    fn test_build_default() {
        let mut table = FactoryTable::new();
        table.register_default::<English>();
        assert!(table.contains::<English>());
        assert!(table.build::<English>().is_some());
    }

    #[test]
    fn test_each_build_is_fresh() {
        let mut table = FactoryTable::new();
        table.register_default::<English>();
        let a = table.build::<English>().unwrap();
        let b = table.build::<English>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_missing_factory() {
        let table = FactoryTable::new();
        assert!(table.build::<English>().is_none());
        assert!(table.is_empty());
    }
}
