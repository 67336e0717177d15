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

use std::any::{type_name, Any};
use std::sync::Arc;
use tessera_core::liveness::Liveness;

/// One contract binding held by a [`TypedRegistry`](super::TypedRegistry).
///
/// The entry shares the target through an `Arc`. A [`Liveness::Plain`] entry
/// therefore keeps its target alive until it is removed; a [`Liveness::Host`]
/// entry never decides when the target is destroyed: the host does, and
/// reports it through the probe.
pub struct RegisteredEntry {
    contract: &'static str,
    target: Box<dyn Any + Send + Sync>,
    address: usize,
    liveness: Liveness,
}

impl RegisteredEntry {
    pub(crate) fn new<C: ?Sized + Send + Sync + 'static>(target: Arc<C>, liveness: Liveness) -> Self {
        Self {
            contract: type_name::<C>(),
            address: address_of(&target),
            target: Box::new(target),
            liveness,
        }
    }

    /// Type name of the contract this entry is bound to.
    pub fn contract(&self) -> &'static str {
        self.contract
    }

    /// Returns whether the target's owner still considers it alive.
    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    pub(crate) fn target<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.target.downcast_ref::<Arc<C>>().cloned()
    }

    pub(crate) fn points_to(&self, address: usize) -> bool {
        self.address == address
    }
}

impl std::fmt::Debug for RegisteredEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredEntry")
            .field("contract", &self.contract)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Address of the data behind an `Arc`, without the vtable of a fat pointer.
///
/// Two `Arc`s to the same object compare equal even when one of them was
/// coerced to a trait object.
pub(crate) fn address_of<T: ?Sized>(target: &Arc<T>) -> usize {
    Arc::as_ptr(target) as *const () as usize
}
