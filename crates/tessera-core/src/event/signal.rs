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

use super::failure::{FailureSink, ListenerFailure, ListenerKind};
use parking_lot::Mutex;
use std::any::{type_name, Any};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A signal listener. Identity is the identity of the `Arc`.
///
/// Multi-argument signals carry a tuple payload: `Listener<(u32, String)>`.
pub type Listener<A> = Arc<dyn Fn(&A) -> anyhow::Result<()> + Send + Sync>;

/// Wraps a closure into a [`Listener`].
///
/// Keep the returned `Arc` around if you plan to unsubscribe later.
pub fn listener<A, F>(f: F) -> Listener<A>
where
    F: Fn(&A) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Outcome of a single [`Signal::dispatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of listeners invoked, across both chains.
    pub invoked: usize,
    /// Number of those listeners that returned an error or panicked.
    pub failed: usize,
}

impl DispatchReport {
    /// Returns `true` if every invoked listener succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

struct Chains<A> {
    persistent: Vec<Listener<A>>,
    once: Vec<Listener<A>>,
}

impl<A> Default for Chains<A> {
    fn default() -> Self {
        Self {
            persistent: Vec::new(),
            once: Vec::new(),
        }
    }
}

fn contains<A>(chain: &[Listener<A>], candidate: &Listener<A>) -> bool {
    chain.iter().any(|l| Arc::ptr_eq(l, candidate))
}

/// A single event channel with persistent and one-shot listeners.
///
/// Dispatch runs the persistent chain, then the one-shot chain, each in
/// subscription order. The persistent chain is snapshotted and the one-shot
/// chain is taken before any listener runs, so listeners may subscribe,
/// unsubscribe or dispatch again while a dispatch is in flight. A one-shot
/// listener subscribed during a dispatch runs on the next one.
pub struct Signal<A: 'static> {
    chains: Mutex<Chains<A>>,
    sink: Option<Arc<dyn FailureSink>>,
}

impl<A: 'static> Signal<A> {
    /// Creates a signal with no listeners and no failure sink.
    pub fn new() -> Self {
        Self {
            chains: Mutex::new(Chains::default()),
            sink: None,
        }
    }

    /// Creates a signal that forwards listener failures to `sink`.
    pub fn with_sink(sink: Arc<dyn FailureSink>) -> Self {
        Self {
            chains: Mutex::new(Chains::default()),
            sink: Some(sink),
        }
    }

    /// Adds a persistent listener. Subscribing the same listener twice is a no-op.
    pub fn subscribe(&self, listener: &Listener<A>) {
        let mut chains = self.chains.lock();
        if !contains(&chains.persistent, listener) {
            chains.persistent.push(Arc::clone(listener));
        }
    }

    /// Adds a listener that runs on the next dispatch only.
    pub fn subscribe_once(&self, listener: &Listener<A>) {
        let mut chains = self.chains.lock();
        if !contains(&chains.once, listener) {
            chains.once.push(Arc::clone(listener));
        }
    }

    /// Removes a persistent listener.
    ///
    /// One-shot listeners are consumed by the next dispatch and cannot be
    /// removed individually. Returns `true` if the listener was found.
    pub fn unsubscribe(&self, listener: &Listener<A>) -> bool {
        let mut chains = self.chains.lock();
        let before = chains.persistent.len();
        chains.persistent.retain(|l| !Arc::ptr_eq(l, listener));
        chains.persistent.len() != before
    }

    /// Clears both chains. Used when the owner of the signal is torn down.
    pub fn remove_all_listeners(&self) {
        let mut chains = self.chains.lock();
        chains.persistent.clear();
        chains.once.clear();
    }

    /// Returns `(persistent, one_shot)` listener counts.
    pub fn listener_count(&self) -> (usize, usize) {
        let chains = self.chains.lock();
        (chains.persistent.len(), chains.once.len())
    }

    /// Invokes every listener with `args`.
    ///
    /// A listener returning `Err` or panicking is reported and skipped; the
    /// remaining listeners of both chains still run. Every one-shot listener
    /// present when the dispatch starts is consumed by it, whatever happened.
    pub fn dispatch(&self, args: A) -> DispatchReport {
        let (persistent, once) = {
            let mut chains = self.chains.lock();
            (chains.persistent.clone(), std::mem::take(&mut chains.once))
        };
        log::trace!(
            "Dispatching Signal<{}> to {} listener(s).",
            type_name::<A>(),
            persistent.len() + once.len()
        );

        let mut report = DispatchReport::default();
        for (kind, chain) in [
            (ListenerKind::Persistent, &persistent),
            (ListenerKind::Once, &once),
        ] {
            for (position, listener) in chain.iter().enumerate() {
                report.invoked += 1;
                if let Some(failure) = Self::invoke(listener, &args, kind, position) {
                    report.failed += 1;
                    match &self.sink {
                        Some(sink) => sink.report(&failure),
                        None => log::error!("{failure}"),
                    }
                }
            }
        }
        report
    }

    fn invoke(
        listener: &Listener<A>,
        args: &A,
        kind: ListenerKind,
        position: usize,
    ) -> Option<ListenerFailure> {
        let (message, panicked) = match panic::catch_unwind(AssertUnwindSafe(|| listener(args))) {
            Ok(Ok(())) => return None,
            Ok(Err(e)) => (format!("{e:#}"), false),
            Err(payload) => (panic_message(payload.as_ref()), true),
        };
        Some(ListenerFailure {
            signal: type_name::<A>(),
            kind,
            position,
            message,
            panicked,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<A: 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (persistent, once) = self.listener_count();
        f.debug_struct("Signal")
            .field("payload", &type_name::<A>())
            .field("persistent", &persistent)
            .field("once", &once)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
