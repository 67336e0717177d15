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

use super::typed::{Factory, Pool};
use super::{PoolError, Poolable};
use parking_lot::Mutex;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tessera_core::spatial::Pose;
use tokio_util::sync::CancellationToken;

type SharedPool<T> = Arc<Mutex<Pool<T>>>;

/// Type-erased view of a pool, so pools of different types share one table.
trait ErasedPool: Send + Sync {
    fn available(&self) -> usize;
    fn clear(&self);
    fn as_any(&self) -> &dyn Any;
}

struct PoolSlot<T: Poolable>(SharedPool<T>);

impl<T: Poolable> ErasedPool for PoolSlot<T> {
    fn available(&self) -> usize {
        self.0.lock().available()
    }

    fn clear(&self) {
        self.0.lock().clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Every object pool of a runtime, one per pooled type.
///
/// Pools are keyed by the pooled type's name and must be created explicitly
/// before the first rent.
#[derive(Default)]
pub struct PoolSystem {
    pools: HashMap<&'static str, Box<dyn ErasedPool>>,
}

impl PoolSystem {
    /// Creates a system with no pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the pool for `T`, cloning `prototype` for new instances.
    ///
    /// Returns `false` and keeps the existing pool if `T` already has one.
    pub fn create_pool<T: Poolable + Clone + Sync>(&mut self, prototype: T) -> bool {
        self.install(Pool::from_prototype(prototype))
    }

    /// Creates the pool for `T`, building new instances through `factory`.
    pub fn create_pool_with<T, F>(&mut self, factory: F) -> bool
    where
        T: Poolable,
        F: Fn() -> Result<T, PoolError> + Send + Sync + 'static,
    {
        self.install(Pool::new(Arc::new(factory)))
    }

    fn install<T: Poolable>(&mut self, pool: Pool<T>) -> bool {
        let key = type_name::<T>();
        if self.pools.contains_key(key) {
            log::debug!("PoolSystem: Pool for '{key}' already exists.");
            return false;
        }
        log::info!("PoolSystem: Created pool for '{key}'.");
        self.pools
            .insert(key, Box::new(PoolSlot(Arc::new(Mutex::new(pool)))));
        true
    }

    fn shared<T: Poolable>(&self) -> Option<SharedPool<T>> {
        self.pools
            .get(type_name::<T>())
            .and_then(|slot| slot.as_any().downcast_ref::<PoolSlot<T>>())
            .map(|slot| Arc::clone(&slot.0))
    }

    /// Rents a `T` placed at `placement`.
    pub fn try_rent<T: Poolable>(&self, placement: Pose) -> Result<T, PoolError> {
        let pool = self.shared::<T>().ok_or(PoolError::NoPool {
            pool: type_name::<T>(),
        })?;
        let mut pool = pool.lock();
        pool.rent(placement)
    }

    /// Rents a `T` placed at `placement`.
    ///
    /// Returns `None` if no pool exists for `T` or its factory failed; the
    /// reason is logged.
    pub fn rent<T: Poolable>(&self, placement: Pose) -> Option<T> {
        match self.try_rent(placement) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("PoolSystem: {e}");
                None
            }
        }
    }

    /// Returns `item` to its pool, parked at the neutral pose.
    ///
    /// Without a pool for `T` nothing happens and the item is handed back.
    pub fn give_back<T: Poolable>(&self, item: T) -> Result<(), T> {
        match self.shared::<T>() {
            Some(pool) => {
                pool.lock().give_back(item);
                Ok(())
            }
            None => {
                log::warn!("PoolSystem: No pool for '{}', item not returned.", type_name::<T>());
                Err(item)
            }
        }
    }

    /// Builds `count` instances of `T` ahead of time without blocking the caller.
    ///
    /// The returned future owns everything it needs and can be awaited or
    /// spawned. It yields to the executor every `threshold` instances
    /// (`0` counts as `1`) and checks `cancel` at each yield. A cancelled or
    /// failed preload discards the partial batch and calls `on_error`; a
    /// complete one adds the batch to the pool and calls `on_complete` with
    /// the number of instances added.
    pub fn preload<T, C, E>(
        &self,
        count: usize,
        threshold: usize,
        cancel: CancellationToken,
        on_complete: C,
        on_error: E,
    ) -> impl Future<Output = ()> + Send + 'static
    where
        T: Poolable,
        C: FnOnce(usize) + Send + 'static,
        E: FnOnce(PoolError) + Send + 'static,
    {
        let pool = self.shared::<T>();
        async move {
            let Some(pool) = pool else {
                on_error(PoolError::NoPool {
                    pool: type_name::<T>(),
                });
                return;
            };
            let factory = pool.lock().factory();
            match build_batch(factory, count, threshold.max(1), &cancel).await {
                Ok(batch) => {
                    let added = pool.lock().absorb(batch);
                    log::debug!("PoolSystem: Preloaded {added} '{}'.", type_name::<T>());
                    on_complete(added);
                }
                Err(e) => {
                    log::warn!("PoolSystem: {e}");
                    on_error(e);
                }
            }
        }
    }

    /// Number of inactive `T` ready to be rented, or `None` without a pool.
    pub fn available<T: Poolable>(&self) -> Option<usize> {
        self.shared::<T>().map(|pool| pool.lock().available())
    }

    /// Returns `true` if a pool exists for `T`.
    pub fn has_pool<T: Poolable>(&self) -> bool {
        self.pools.contains_key(type_name::<T>())
    }

    /// Number of pools.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Returns `true` if no pool was created.
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Total inactive instances across every pool.
    pub fn total_available(&self) -> usize {
        self.pools.values().map(|slot| slot.available()).sum()
    }

    /// Drops every inactive instance and every pool.
    pub fn clear(&mut self) {
        for slot in self.pools.values() {
            slot.clear();
        }
        self.pools.clear();
    }
}

async fn build_batch<T: Poolable>(
    factory: Factory<T>,
    count: usize,
    step: usize,
    cancel: &CancellationToken,
) -> Result<Vec<T>, PoolError> {
    let mut batch = Vec::with_capacity(count);
    for built in 0..count {
        if built % step == 0 {
            if built > 0 {
                tokio::task::yield_now().await;
            }
            if cancel.is_cancelled() {
                return Err(PoolError::Cancelled {
                    pool: type_name::<T>(),
                    built,
                });
            }
        }
        batch.push(factory()?);
    }
    Ok(batch)
}

impl fmt::Debug for PoolSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.pools.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("PoolSystem").field("pools", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tessera_core::spatial::{ParentId, Quat, Vec3};

    #[derive(Debug, Clone, Default)]
    struct Enemy {
        pose: Pose,
        active: bool,
    }

    impl Poolable for Enemy {
        fn pose(&self) -> &Pose {
            &self.pose
        }

        fn pose_mut(&mut self) -> &mut Pose {
            &mut self.pose
        }

        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
    }

    #[derive(Debug, Default)]
    struct Spark {
        pose: Pose,
    }

    impl Poolable for Spark {
        fn pose(&self) -> &Pose {
            &self.pose
        }

        fn pose_mut(&mut self) -> &mut Pose {
            &mut self.pose
        }

        fn set_active(&mut self, _active: bool) {}
    }

    #[test]
    fn test_create_pool_once() {
        let mut pools = PoolSystem::new();
        assert!(pools.create_pool(Enemy::default()));
        assert!(!pools.create_pool(Enemy::default()));
        assert_eq!(pools.len(), 1);
    }

    #[test]
    fn test_rent_without_pool_is_none() {
        let pools = PoolSystem::new();
        assert!(pools.rent::<Enemy>(Pose::NEUTRAL).is_none());
        assert!(matches!(
            pools.try_rent::<Enemy>(Pose::NEUTRAL),
            Err(PoolError::NoPool { .. })
        ));
    }

    #[test]
    fn test_give_back_without_pool_hands_item_back() {
        let pools = PoolSystem::new();
        let spark = Spark::default();
        assert!(pools.give_back(spark).is_err());
    }

    #[test]
    fn test_rent_places_with_parent() {
        let mut pools = PoolSystem::new();
        pools.create_pool(Enemy::default());
        let placement = Pose {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 0.5),
            parent: Some(ParentId(1)),
            world_space: false,
        };
        let enemy = pools.rent::<Enemy>(placement).unwrap();
        assert_eq!(enemy.pose, placement);
        assert!(enemy.active);

        pools.give_back(enemy).unwrap();
        assert_eq!(pools.available::<Enemy>(), Some(1));
    }

    #[tokio::test]
    async fn test_preload_fills_pool() {
        let mut pools = PoolSystem::new();
        pools.create_pool(Enemy::default());
        let completed = Arc::new(AtomicUsize::new(0));
        let done = Arc::clone(&completed);

        pools
            .preload::<Enemy, _, _>(
                10,
                3,
                CancellationToken::new(),
                move |n| done.store(n, Ordering::SeqCst),
                |e| panic!("unexpected preload error: {e}"),
            )
            .await;

        assert_eq!(completed.load(Ordering::SeqCst), 10);
        assert_eq!(pools.available::<Enemy>(), Some(10));
    }

    #[tokio::test]
    async fn test_preload_cancelled_discards_batch() {
        let mut pools = PoolSystem::new();
        pools.create_pool(Enemy::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let error = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&error);

        pools
            .preload::<Enemy, _, _>(
                5,
                2,
                cancel,
                |_| panic!("cancelled preload must not complete"),
                move |e| *seen.lock() = Some(e),
            )
            .await;

        assert!(matches!(
            *error.lock(),
            Some(PoolError::Cancelled { built: 0, .. })
        ));
        assert_eq!(pools.available::<Enemy>(), Some(0));
    }

    #[tokio::test]
    async fn test_preload_cancelled_mid_batch_drops_partial_batch() {
        let mut pools = PoolSystem::new();
        let cancel = CancellationToken::new();
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let trigger = cancel.clone();
        // The third build cancels; the next yield point sees it.
        pools.create_pool_with(move || -> Result<Spark, PoolError> {
            if counter.fetch_add(1, Ordering::SeqCst) == 2 {
                trigger.cancel();
            }
            Ok(Spark::default())
        });
        let error = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&error);

        pools
            .preload::<Spark, _, _>(
                10,
                2,
                cancel,
                |_| panic!("cancelled preload must not complete"),
                move |e| *seen.lock() = Some(e),
            )
            .await;

        assert!(matches!(
            *error.lock(),
            Some(PoolError::Cancelled { built: 4, .. })
        ));
        assert_eq!(builds.load(Ordering::SeqCst), 4);
        assert_eq!(pools.available::<Spark>(), Some(0));
    }

    #[tokio::test]
    async fn test_preload_factory_failure_reports_error() {
        let mut pools = PoolSystem::new();
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        pools.create_pool_with(move || {
            if counter.fetch_add(1, Ordering::SeqCst) >= 2 {
                Err(PoolError::Build {
                    pool: "Spark",
                    reason: "prefab missing".to_string(),
                })
            } else {
                Ok(Spark::default())
            }
        });
        let error = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&error);

        pools
            .preload::<Spark, _, _>(
                4,
                1,
                CancellationToken::new(),
                |_| panic!("failing preload must not complete"),
                move |e| *seen.lock() = Some(e),
            )
            .await;

        assert!(matches!(*error.lock(), Some(PoolError::Build { .. })));
        assert_eq!(pools.available::<Spark>(), Some(0));
    }

    #[tokio::test]
    async fn test_preload_without_pool_reports_error() {
        let pools = PoolSystem::new();
        let error = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&error);
        pools
            .preload::<Spark, _, _>(
                1,
                1,
                CancellationToken::new(),
                |_| {},
                move |e| *seen.lock() = Some(e),
            )
            .await;
        assert!(matches!(*error.lock(), Some(PoolError::NoPool { .. })));
    }

    #[test]
    fn test_clear_removes_pools() {
        let mut pools = PoolSystem::new();
        pools.create_pool(Enemy::default());
        let enemy = pools.rent::<Enemy>(Pose::NEUTRAL).unwrap();
        pools.give_back(enemy).unwrap();
        assert_eq!(pools.total_available(), 1);

        pools.clear();
        assert!(pools.is_empty());
        assert!(!pools.has_pool::<Enemy>());
    }
}
