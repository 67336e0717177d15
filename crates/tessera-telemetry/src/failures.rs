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

//! Collection of listener failures.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tessera_core::event::{FailureSink, ListenerFailure};

/// Number of recent failures kept by [`FailureLog::new`].
pub const DEFAULT_CAPACITY: usize = 64;

/// A [`FailureSink`] that logs every failure at `error` and keeps the most
/// recent ones. Signals using it as their sink do not log failures themselves.
#[derive(Debug)]
pub struct FailureLog {
    total: AtomicU64,
    capacity: usize,
    recent: Mutex<VecDeque<ListenerFailure>>,
}

impl FailureLog {
    /// Creates a log keeping the last [`DEFAULT_CAPACITY`] failures.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a log keeping the last `capacity` failures.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            total: AtomicU64::new(0),
            capacity,
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Number of failures reported since creation.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// The retained failures, oldest first.
    pub fn recent(&self) -> Vec<ListenerFailure> {
        self.recent.lock().iter().cloned().collect()
    }

    /// Forgets the retained failures. The total is kept.
    pub fn clear(&self) {
        self.recent.lock().clear();
    }
}

impl Default for FailureLog {
    fn default() -> Self {
        Self::new()
    }
}

impl FailureSink for FailureLog {
    fn report(&self, failure: &ListenerFailure) {
        self.total.fetch_add(1, Ordering::Relaxed);
        log::error!("FailureLog: {failure}");

        if self.capacity == 0 {
            return;
        }
        let mut recent = self.recent.lock();
        if recent.len() == self.capacity {
            recent.pop_front();
        }
        recent.push_back(failure.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessera_core::event::{listener, Signal};

    #[test]
    fn test_failures_are_counted_and_bounded() {
        let log = Arc::new(FailureLog::with_capacity(2));
        let signal: Signal<u32> = Signal::with_sink(log.clone());
        let failing = listener(|n: &u32| Err(anyhow::anyhow!("bad input {n}")));
        signal.subscribe(&failing);

        for n in 0..3 {
            signal.dispatch(n);
        }

        assert_eq!(log.total(), 3);
        let recent = log.recent();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].message.contains("bad input 1"));
        assert!(recent[1].message.contains("bad input 2"));

        log.clear();
        assert!(log.recent().is_empty());
        assert_eq!(log.total(), 3);
    }
}
