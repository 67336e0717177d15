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

//! Rent/return object pools keyed by pooled type.
//!
//! Pools keep inactive instances of host objects around so they can be
//! handed out again instead of rebuilt. A returned instance is always parked
//! at [`Pose::NEUTRAL`] and deactivated; renting it places and activates it.

mod system;
mod typed;

pub use self::system::PoolSystem;
pub use self::typed::{Factory, Pool};

use std::fmt;
use tessera_core::spatial::Pose;

/// An object that can live in a [`Pool`].
pub trait Poolable: Send + 'static {
    /// Current placement of the object.
    fn pose(&self) -> &Pose;

    /// Mutable placement of the object.
    fn pose_mut(&mut self) -> &mut Pose;

    /// Shows or hides the object in the host.
    fn set_active(&mut self, active: bool);

    /// Resets object-specific state before it goes back to the free list.
    fn before_return(&mut self) {}
}

/// An error raised by a pool operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No pool was created for the requested type.
    NoPool {
        /// Type name of the pooled type.
        pool: &'static str,
    },
    /// The pool's factory failed to build an instance.
    Build {
        /// Type name of the pooled type.
        pool: &'static str,
        /// Reason reported by the factory.
        reason: String,
    },
    /// A preload was cancelled before it completed.
    Cancelled {
        /// Type name of the pooled type.
        pool: &'static str,
        /// Instances built (and discarded) before cancellation.
        built: usize,
    },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::NoPool { pool } => write!(f, "No pool created for '{pool}'"),
            PoolError::Build { pool, reason } => {
                write!(f, "Failed to build a '{pool}' instance: {reason}")
            }
            PoolError::Cancelled { pool, built } => {
                write!(f, "Preload of '{pool}' cancelled after {built} instance(s)")
            }
        }
    }
}

impl std::error::Error for PoolError {}
