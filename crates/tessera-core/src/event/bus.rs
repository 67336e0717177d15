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

use super::failure::FailureSink;
use super::signal::{DispatchReport, Listener, Signal};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A table of [`Signal`]s keyed by payload type.
///
/// Every event type `E` gets exactly one signal, created on first use. Signals
/// created by the bus inherit the bus's [`FailureSink`].
#[derive(Default)]
pub struct SignalBus {
    signals: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    sink: Option<Arc<dyn FailureSink>>,
}

impl SignalBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty bus whose signals report failures to `sink`.
    pub fn with_sink(sink: Arc<dyn FailureSink>) -> Self {
        Self {
            signals: HashMap::new(),
            sink: Some(sink),
        }
    }

    /// Installs an externally built signal for `E`.
    ///
    /// First writer wins: if a signal for `E` already exists the call is a
    /// no-op and returns `false`.
    pub fn insert<E: 'static>(&mut self, signal: Signal<E>) -> bool {
        let key = TypeId::of::<E>();
        if self.signals.contains_key(&key) {
            log::debug!("SignalBus: Signal<{}> already present.", type_name::<E>());
            return false;
        }
        self.signals.insert(key, Box::new(signal));
        true
    }

    /// Returns the signal for `E`, creating it if needed.
    pub fn signal<E: 'static>(&mut self) -> &Signal<E> {
        let sink = self.sink.clone();
        self.signals
            .entry(TypeId::of::<E>())
            .or_insert_with(|| {
                let signal = match sink {
                    Some(sink) => Signal::<E>::with_sink(sink),
                    None => Signal::<E>::new(),
                };
                Box::new(signal)
            })
            .downcast_ref::<Signal<E>>()
            .expect("SignalBus entries are keyed by their payload TypeId")
    }

    /// Returns the signal for `E` if one was created.
    pub fn get<E: 'static>(&self) -> Option<&Signal<E>> {
        self.signals
            .get(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast_ref::<Signal<E>>())
    }

    /// Subscribes a persistent listener to `E`.
    pub fn subscribe<E: 'static>(&mut self, listener: &Listener<E>) {
        self.signal::<E>().subscribe(listener);
    }

    /// Subscribes a one-shot listener to `E`.
    pub fn subscribe_once<E: 'static>(&mut self, listener: &Listener<E>) {
        self.signal::<E>().subscribe_once(listener);
    }

    /// Removes a persistent listener from `E`. Returns `true` if it was found.
    pub fn unsubscribe<E: 'static>(&self, listener: &Listener<E>) -> bool {
        self.get::<E>().is_some_and(|s| s.unsubscribe(listener))
    }

    /// Dispatches `event` to every listener of `E`.
    ///
    /// Dispatching a type nobody subscribed to is not an error.
    pub fn dispatch<E: 'static>(&self, event: E) -> DispatchReport {
        match self.get::<E>() {
            Some(signal) => signal.dispatch(event),
            None => DispatchReport::default(),
        }
    }

    /// Number of distinct event types with a signal.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns `true` if no signal has been created.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Drops every signal and all of their listeners.
    pub fn clear(&mut self) {
        log::debug!("SignalBus: Clearing {} signal(s).", self.signals.len());
        self.signals.clear();
    }
}

impl fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBus")
            .field("signals", &self.signals.len())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
