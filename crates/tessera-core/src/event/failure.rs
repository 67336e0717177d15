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

use std::fmt;

/// Which chain a listener was subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// Invoked on every dispatch until unsubscribed.
    Persistent,
    /// Invoked on the next dispatch only.
    Once,
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerKind::Persistent => write!(f, "persistent"),
            ListenerKind::Once => write!(f, "one-shot"),
        }
    }
}

/// A single listener that failed during a dispatch.
#[derive(Debug, Clone)]
pub struct ListenerFailure {
    /// Type name of the payload carried by the signal.
    pub signal: &'static str,
    /// The chain the failing listener belonged to.
    pub kind: ListenerKind,
    /// Position of the listener within its chain at dispatch time.
    pub position: usize,
    /// The error message, or the panic payload if the listener panicked.
    pub message: String,
    /// Whether the listener panicked instead of returning an error.
    pub panicked: bool,
}

impl fmt::Display for ListenerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.panicked { "panicked" } else { "failed" };
        write!(
            f,
            "{} listener #{} of Signal<{}> {}: {}",
            self.kind, self.position, self.signal, verb, self.message
        )
    }
}

/// Receives listener failures isolated by a dispatch.
///
/// Implemented by the telemetry layer; signals without a sink only log.
pub trait FailureSink: Send + Sync {
    /// Records one failure. Must not panic.
    fn report(&self, failure: &ListenerFailure);
}
