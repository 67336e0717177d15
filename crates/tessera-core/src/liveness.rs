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

//! Liveness tracking for objects whose lifetime is owned by a host.
//!
//! A host (an engine scene, a UI tree, ...) can destroy an object while other
//! parts of the program still hold a reference to it. Registries never own
//! such objects: they keep a [`LivenessProbe`] next to the reference and ask
//! it before handing the reference out again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Owner-side liveness token.
///
/// The owner keeps the `Lifeline` for as long as the object exists and calls
/// [`destroy`](Lifeline::destroy) when the host tears it down. Dropping every
/// clone of the lifeline has the same effect.
#[derive(Debug, Clone)]
pub struct Lifeline {
    alive: Arc<AtomicBool>,
}

impl Lifeline {
    /// Creates a new, alive lifeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Marks the tracked object as destroyed. Calling it twice is harmless.
    pub fn destroy(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Returns `true` until [`destroy`](Lifeline::destroy) has been called.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Hands out a non-owning probe for this lifeline.
    #[must_use]
    pub fn probe(&self) -> LivenessProbe {
        LivenessProbe {
            alive: Arc::downgrade(&self.alive),
        }
    }
}

impl Default for Lifeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning view of a [`Lifeline`].
#[derive(Debug, Clone)]
pub struct LivenessProbe {
    alive: Weak<AtomicBool>,
}

impl LivenessProbe {
    /// Returns `false` once the owner destroyed the object or dropped its lifeline.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
            .upgrade()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }
}

/// How a registered object reports whether it is still usable.
///
/// This is a closed set: plain values managed by Rust ownership are alive as
/// long as they are registered, host objects defer to their owner's lifeline.
#[derive(Debug, Clone)]
pub enum Liveness {
    /// A plain value co-owned by whoever registered it. Always alive.
    Plain,
    /// An object owned by a host that may destroy it at any time.
    Host(LivenessProbe),
}

impl Liveness {
    /// Returns whether the underlying object can still be used.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        match self {
            Liveness::Plain => true,
            Liveness::Host(probe) => probe.is_alive(),
        }
    }
}

impl From<LivenessProbe> for Liveness {
    fn from(probe: LivenessProbe) -> Self {
        Liveness::Host(probe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifeline_starts_alive() {
        let lifeline = Lifeline::new();
        assert!(lifeline.is_alive());
        assert!(lifeline.probe().is_alive());
    }

    #[test]
    fn test_destroy_is_seen_by_probes() {
        let lifeline = Lifeline::new();
        let probe = lifeline.probe();
        lifeline.destroy();
        assert!(!probe.is_alive());
        // Idempotent
        lifeline.destroy();
        assert!(!lifeline.is_alive());
    }

    #[test]
    fn test_dropping_lifeline_kills_probe() {
        let lifeline = Lifeline::new();
        let probe = lifeline.probe();
        drop(lifeline);
        assert!(!probe.is_alive());
    }

    #[test]
    fn test_clone_keeps_probe_alive() {
        let lifeline = Lifeline::new();
        let probe = lifeline.probe();
        let clone = lifeline.clone();
        drop(lifeline);
        assert!(probe.is_alive());
        clone.destroy();
        assert!(!probe.is_alive());
    }

    #[test]
    fn test_liveness_variants() {
        assert!(Liveness::Plain.is_alive());

        let lifeline = Lifeline::new();
        let liveness: Liveness = lifeline.probe().into();
        assert!(liveness.is_alive());
        lifeline.destroy();
        assert!(!liveness.is_alive());
    }
}
