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

/// An error raised by a [`TypedRegistry`](super::TypedRegistry) operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A live implementation is already registered for the contract.
    Duplicate {
        /// Type name of the contract.
        contract: &'static str,
    },
    /// No live implementation is registered and none could be built.
    NotFound {
        /// Type name of the contract.
        contract: &'static str,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Duplicate { contract } => {
                write!(f, "A live dependency is already registered for '{contract}'")
            }
            RegistryError::NotFound { contract } => {
                write!(f, "Dependency not found for '{contract}'")
            }
        }
    }
}

impl std::error::Error for RegistryError {}
