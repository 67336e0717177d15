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

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// The capability views a service advertises for [`ServiceLocator::get_all`].
///
/// A capability is usually a trait object: a service implementing `Tick`
/// adds itself as `Arc<dyn Tick>`.
///
/// [`ServiceLocator::get_all`]: super::ServiceLocator::get_all
#[derive(Default)]
pub struct Capabilities {
    views: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Capabilities {
    /// Creates an empty capability set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertises `view` under capability `C`. A second view for `C` replaces the first.
    pub fn add<C: ?Sized + Send + Sync + 'static>(&mut self, view: Arc<C>) {
        self.views.insert(TypeId::of::<C>(), Box::new(view));
    }

    /// Returns the view registered for `C`.
    pub fn get<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.views
            .get(&TypeId::of::<C>())
            .and_then(|boxed| boxed.downcast_ref::<Arc<C>>())
            .cloned()
    }

    /// Number of advertised capabilities.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns `true` if nothing is advertised.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
