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

use super::capabilities::Capabilities;
use super::host::{ContainerId, DetachedHost, ServiceHost};
use indexmap::IndexMap;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Where a service lives once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceKind {
    /// A plain value owned by the locator.
    #[default]
    Plain,
    /// Must be attached to a host container named after the service type.
    HostAttached,
}

/// A singleton-like service resolvable through a [`ServiceLocator`].
///
/// `create` replaces reflection-based construction: every service says how
/// to build itself.
pub trait Service: Sized + Send + Sync + 'static {
    /// Builds the instance used when nobody [`set`](ServiceLocator::set) one.
    fn create() -> Self;

    /// Whether the built instance needs a host container.
    fn kind() -> ServiceKind {
        ServiceKind::Plain
    }

    /// Advertises capability views of `this` for [`ServiceLocator::get_all`].
    fn capabilities(_this: &Arc<Self>, _caps: &mut Capabilities) {}
}

struct ServiceEntry {
    name: &'static str,
    instance: Box<dyn Any + Send + Sync>,
    capabilities: Capabilities,
    container: Option<ContainerId>,
}

/// A type-map of service singletons keyed by their concrete [`TypeId`].
///
/// Entries keep registration order so [`get_all`](ServiceLocator::get_all)
/// is deterministic.
///
/// # Example
///
/// ```rust
/// use tessera_core::locator::{Service, ServiceLocator};
///
/// #[derive(Default)]
/// struct Clock { ticks: u64 }
///
/// impl Service for Clock {
///     fn create() -> Self { Clock::default() }
/// }
///
/// let mut locator = ServiceLocator::new();
/// let a = locator.get::<Clock>();
/// let b = locator.get::<Clock>();
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// ```
pub struct ServiceLocator {
    services: IndexMap<TypeId, ServiceEntry>,
    host: Box<dyn ServiceHost>,
}

impl ServiceLocator {
    /// Creates an empty locator backed by a [`DetachedHost`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_host(Box::new(DetachedHost::new()))
    }

    /// Creates an empty locator that spawns host containers through `host`.
    #[must_use]
    pub fn with_host(host: Box<dyn ServiceHost>) -> Self {
        Self {
            services: IndexMap::new(),
            host,
        }
    }

    /// Replaces the host used for services built from now on and returns the
    /// previous one. Services already resolved stay registered and keep
    /// their containers.
    pub fn set_host(&mut self, host: Box<dyn ServiceHost>) -> Box<dyn ServiceHost> {
        log::debug!(
            "ServiceLocator: Switching host with {} service(s) registered.",
            self.services.len()
        );
        std::mem::replace(&mut self.host, host)
    }

    /// Resolves `T`, building and registering it on first access.
    ///
    /// Construction happens at most once per type for the locator's lifetime
    /// (or until [`clear`](ServiceLocator::clear)).
    pub fn get<T: Service>(&mut self) -> Arc<T> {
        if let Some(existing) = self.try_get::<T>() {
            return existing;
        }

        let container = match T::kind() {
            ServiceKind::Plain => None,
            ServiceKind::HostAttached => Some(self.host.spawn_container(type_name::<T>())),
        };
        let instance = Arc::new(T::create());
        log::info!(
            "ServiceLocator: Created {}{}",
            type_name::<T>(),
            container.map(|c| format!(" on {c}")).unwrap_or_default()
        );
        self.insert_entry(Arc::clone(&instance), container);
        instance
    }

    /// Returns `T` if it has been built or set, without building it.
    #[must_use]
    pub fn try_get<T: Service>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.instance.downcast_ref::<Arc<T>>())
            .cloned()
    }

    /// Registers `instance` unless an instance of `T` already exists.
    ///
    /// Returns `false` (and changes nothing) when `T` is already present.
    pub fn set<T: Service>(&mut self, instance: Arc<T>) -> bool {
        if self.services.contains_key(&TypeId::of::<T>()) {
            log::debug!(
                "ServiceLocator: {} already registered, ignoring set.",
                type_name::<T>()
            );
            return false;
        }
        self.insert_entry(instance, None);
        true
    }

    /// Returns every service assignable to `C`, in registration order.
    ///
    /// A service matches if it is a `C` itself or advertised a `C` view in
    /// [`Service::capabilities`]. Each service contributes at most once.
    pub fn get_all<C: ?Sized + Send + Sync + 'static>(&self) -> Vec<Arc<C>> {
        self.services
            .values()
            .filter_map(|entry| {
                entry
                    .instance
                    .downcast_ref::<Arc<C>>()
                    .cloned()
                    .or_else(|| entry.capabilities.get::<C>())
            })
            .collect()
    }

    /// Returns the host container `T` was attached to, if any.
    #[must_use]
    pub fn container_of<T: Service>(&self) -> Option<ContainerId> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.container)
    }

    /// Returns `true` if `T` is registered.
    #[must_use]
    pub fn contains<T: Service>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Names of registered services, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.services.values().map(|entry| entry.name)
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Drops every service reference held by the locator.
    pub fn clear(&mut self) {
        log::debug!("ServiceLocator: Clearing {} service(s).", self.services.len());
        self.services.clear();
    }

    fn insert_entry<T: Service>(&mut self, instance: Arc<T>, container: Option<ContainerId>) {
        let mut capabilities = Capabilities::new();
        T::capabilities(&instance, &mut capabilities);
        self.services.insert(
            TypeId::of::<T>(),
            ServiceEntry {
                name: type_name::<T>(),
                instance: Box::new(instance),
                capabilities,
                container,
            },
        );
    }
}

impl Default for ServiceLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceLocator")
            .field("services", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
