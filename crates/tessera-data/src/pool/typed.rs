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

use super::{PoolError, Poolable};
use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use tessera_core::spatial::Pose;

/// Builds a fresh pooled instance.
pub type Factory<T> = Arc<dyn Fn() -> Result<T, PoolError> + Send + Sync>;

/// A free list of inactive `T` plus the factory used when it runs dry.
pub struct Pool<T: Poolable> {
    free: Vec<T>,
    factory: Factory<T>,
    built: usize,
}

impl<T: Poolable> Pool<T> {
    /// Creates an empty pool that builds instances through `factory`.
    pub fn new(factory: Factory<T>) -> Self {
        Self {
            free: Vec::new(),
            factory,
            built: 0,
        }
    }

    /// Creates an empty pool that clones `prototype` for every new instance.
    pub fn from_prototype(prototype: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(Arc::new(move || -> Result<T, PoolError> {
            Ok(prototype.clone())
        }))
    }

    /// Takes an inactive instance, or builds one, and places it at `placement`.
    pub fn rent(&mut self, placement: Pose) -> Result<T, PoolError> {
        let mut item = match self.free.pop() {
            Some(item) => item,
            None => self.build()?,
        };
        *item.pose_mut() = placement;
        item.set_active(true);
        Ok(item)
    }

    /// Resets `item` to the neutral pose, deactivates it and keeps it for reuse.
    pub fn give_back(&mut self, mut item: T) {
        Self::park(&mut item);
        self.free.push(item);
    }

    /// Adds a batch of freshly built instances to the free list.
    pub(crate) fn absorb(&mut self, batch: Vec<T>) -> usize {
        let count = batch.len();
        self.built += count;
        for mut item in batch {
            Self::park(&mut item);
            self.free.push(item);
        }
        count
    }

    fn park(item: &mut T) {
        item.before_return();
        item.pose_mut().reset();
        item.set_active(false);
    }

    fn build(&mut self) -> Result<T, PoolError> {
        let item = (self.factory)()?;
        self.built += 1;
        log::trace!("Pool<{}>: Built instance #{}.", type_name::<T>(), self.built);
        Ok(item)
    }

    /// A handle on the factory, for building outside the pool.
    pub fn factory(&self) -> Factory<T> {
        Arc::clone(&self.factory)
    }

    /// Number of inactive instances ready to be rented.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Number of instances this pool ever built, preloads included.
    pub fn built(&self) -> usize {
        self.built
    }

    /// Drops every inactive instance.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<T: Poolable> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("type", &type_name::<T>())
            .field("available", &self.free.len())
            .field("built", &self.built)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::spatial::{ParentId, Vec3};

    #[derive(Debug, Clone, Default)]
    struct Bullet {
        id: u32,
        pose: Pose,
        active: bool,
        hits: u32,
    }

    impl Poolable for Bullet {
        fn pose(&self) -> &Pose {
            &self.pose
        }

        fn pose_mut(&mut self) -> &mut Pose {
            &mut self.pose
        }

        fn set_active(&mut self, active: bool) {
            self.active = active;
        }

        fn before_return(&mut self) {
            self.hits = 0;
        }
    }

    fn placement() -> Pose {
        Pose {
            position: Vec3::new(4.0, 0.0, -2.0),
            parent: Some(ParentId(9)),
            world_space: false,
            ..Pose::NEUTRAL
        }
    }

    #[test]
    fn test_rent_builds_and_places() {
        let mut pool = Pool::from_prototype(Bullet::default());
        let bullet = pool.rent(placement()).unwrap();
        assert!(bullet.active);
        assert_eq!(bullet.pose, placement());
        assert_eq!(pool.built(), 1);
    }

    #[test]
    fn test_give_back_resets_and_reuses() {
        let mut pool = Pool::from_prototype(Bullet::default());
        let mut bullet = pool.rent(placement()).unwrap();
        bullet.id = 77;
        bullet.hits = 3;
        pool.give_back(bullet);
        assert_eq!(pool.available(), 1);

        let again = pool.rent(Pose::NEUTRAL).unwrap();
        assert_eq!(again.id, 77);
        assert_eq!(again.hits, 0);
        assert!(again.pose.is_neutral());
        assert_eq!(pool.built(), 1);
    }

    #[test]
    fn test_returned_instance_is_parked() {
        let mut pool = Pool::from_prototype(Bullet::default());
        let bullet = pool.rent(placement()).unwrap();
        pool.give_back(bullet);
        let parked = &pool.free[0];
        assert!(!parked.active);
        assert!(parked.pose.is_neutral());
    }

    #[test]
    fn test_factory_failure_propagates() {
        let mut pool = Pool::new(Arc::new(|| -> Result<Bullet, PoolError> {
            Err(PoolError::Build {
                pool: "Bullet",
                reason: "out of prototypes".to_string(),
            })
        }));
        assert!(matches!(
            pool.rent(Pose::NEUTRAL),
            Err(PoolError::Build { .. })
        ));
        assert_eq!(pool.built(), 0);
    }
}
