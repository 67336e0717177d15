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

//! The public-facing SDK for Tessera.
//!
//! [`Runtime`] is the root object of an application: it owns one context
//! registry, one service locator, one signal bus and one pool system, and
//! tears them down together.

#![warn(missing_docs)]

pub mod config;

pub use config::{ConfigError, ConfigStore, FileConfigStore, MemoryConfigStore, RuntimeConfig};

use std::future::Future;
use std::sync::Arc;
use tessera_core::event::SignalBus;
use tessera_core::locator::{ServiceHost, ServiceLocator};
use tessera_data::pool::{PoolError, PoolSystem, Poolable};
use tessera_data::{Context, ContextId, ContextRegistry, FactoryTable};
use tessera_telemetry::FailureLog;
use tokio_util::sync::CancellationToken;

/// Everything needed to write against the runtime.
pub mod prelude {
    pub use crate::{Runtime, RuntimeConfig};
    pub use tessera_control::{State, StateChanged, StateController, StateError, StateKey};
    pub use tessera_core::event::{listener, Listener, Signal};
    pub use tessera_core::locator::{Capabilities, KeyedLocator, Service, ServiceKind};
    pub use tessera_core::spatial::{ParentId, Pose, Quat, Vec3};
    pub use tessera_core::{Lifeline, Liveness, LivenessProbe};
    pub use tessera_data::pool::{PoolError, Poolable};
    pub use tessera_data::{ContextId, FactoryTable, RegistryError};
}

/// The root of a Tessera application.
pub struct Runtime {
    config: RuntimeConfig,
    contexts: ContextRegistry,
    services: ServiceLocator,
    signals: SignalBus,
    pools: PoolSystem,
    failures: Arc<FailureLog>,
    running: bool,
}

impl Runtime {
    /// Builds a runtime with an empty factory table.
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_factories(config, FactoryTable::new())
    }

    /// Builds a runtime whose contexts construct missing dependencies
    /// through `factories`.
    pub fn with_factories(config: RuntimeConfig, factories: FactoryTable) -> Self {
        let failures = Arc::new(FailureLog::new());
        let mut contexts = ContextRegistry::new(factories);
        for id in &config.contexts {
            contexts.get_or_create(*id);
        }
        log::info!(
            "Runtime: Started with {} context(s), preload threshold {}.",
            contexts.len(),
            config.preload_threshold
        );
        Self {
            config,
            contexts,
            services: ServiceLocator::new(),
            signals: SignalBus::with_sink(failures.clone()),
            pools: PoolSystem::new(),
            failures,
            running: true,
        }
    }

    /// Replaces the service host. Services already created stay registered
    /// and keep their containers; only services built later use `host`.
    pub fn with_service_host(mut self, host: Box<dyn ServiceHost>) -> Self {
        self.services.set_host(host);
        self
    }

    /// The configuration this runtime was built from.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The context `id`, created on first use.
    pub fn context(&mut self, id: impl Into<ContextId>) -> &mut Context {
        self.contexts.get_or_create(id)
    }

    /// All contexts.
    pub fn contexts(&self) -> &ContextRegistry {
        &self.contexts
    }

    /// All contexts (mutable).
    pub fn contexts_mut(&mut self) -> &mut ContextRegistry {
        &mut self.contexts
    }

    /// Process-wide services.
    pub fn services(&self) -> &ServiceLocator {
        &self.services
    }

    /// Process-wide services (mutable).
    pub fn services_mut(&mut self) -> &mut ServiceLocator {
        &mut self.services
    }

    /// Event signals.
    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    /// Event signals (mutable).
    pub fn signals_mut(&mut self) -> &mut SignalBus {
        &mut self.signals
    }

    /// Object pools.
    pub fn pools(&self) -> &PoolSystem {
        &self.pools
    }

    /// Object pools (mutable).
    pub fn pools_mut(&mut self) -> &mut PoolSystem {
        &mut self.pools
    }

    /// Listener failures reported by the signal bus.
    pub fn failures(&self) -> &FailureLog {
        &self.failures
    }

    /// Preloads `count` instances of `T` using the configured threshold.
    pub fn preload<T, C, E>(
        &self,
        count: usize,
        cancel: CancellationToken,
        on_complete: C,
        on_error: E,
    ) -> impl Future<Output = ()> + Send + 'static
    where
        T: Poolable,
        C: FnOnce(usize) + Send + 'static,
        E: FnOnce(PoolError) + Send + 'static,
    {
        self.pools.preload::<T, C, E>(
            count,
            self.config.preload_threshold,
            cancel,
            on_complete,
            on_error,
        )
    }

    /// Returns `false` once [`shutdown`](Self::shutdown) has run.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stops every context and drops every signal, service and pool.
    ///
    /// Calling it again is a no-op. Also runs when the runtime is dropped.
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        log::info!("Runtime: Shutting down...");
        self.contexts.stop_all();
        self.signals.clear();
        self.services.clear();
        self.pools.clear();
        self.running = false;
        log::info!(
            "Runtime: Shutdown complete ({} listener failure(s) reported).",
            self.failures.total()
        );
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
