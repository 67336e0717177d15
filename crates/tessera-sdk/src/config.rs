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

//! Runtime configuration and the stores it is read from.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tessera_data::ContextId;

/// Settings used to build a [`Runtime`](crate::Runtime).
///
/// Every field has a default, so a partial or missing file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_filter: String,
    /// Contexts created when the runtime starts.
    pub contexts: Vec<ContextId>,
    /// Instances built between two yields of a preload.
    pub preload_threshold: usize,
    /// Number of ticks the demo binary runs.
    pub ticks: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_owned(),
            contexts: vec![ContextId::GLOBAL],
            preload_threshold: 8,
            ticks: 60,
        }
    }
}

impl RuntimeConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Parse)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Parse)
    }

    /// Loads the configuration from `store`, or the defaults if the store is empty.
    pub fn load(store: &dyn ConfigStore) -> Result<Self, ConfigError> {
        if !store.exists() {
            log::info!(
                "RuntimeConfig: No configuration at {}, using defaults.",
                store.location()
            );
            return Ok(Self::default());
        }
        let config = Self::from_json(&store.read()?)?;
        log::info!("RuntimeConfig: Loaded from {}.", store.location());
        Ok(config)
    }

    /// Writes the configuration to `store`.
    pub fn save(&self, store: &dyn ConfigStore) -> Result<(), ConfigError> {
        store.write(&self.to_json()?)
    }
}

/// Errors raised while reading or writing configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The store could not be read or written.
    Io {
        /// Where the store points to.
        location: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The stored text is not a valid configuration.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { location, source } => {
                write!(f, "Failed to access configuration at {location}: {source}")
            }
            ConfigError::Parse(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

/// A place a configuration document is kept.
pub trait ConfigStore: Send + Sync {
    /// Human-readable location, used in logs and errors.
    fn location(&self) -> String;

    /// Whether a document is present.
    fn exists(&self) -> bool;

    /// Reads the whole document.
    fn read(&self) -> Result<String, ConfigError>;

    /// Replaces the whole document.
    fn write(&self, contents: &str) -> Result<(), ConfigError>;
}

/// A [`ConfigStore`] backed by a single file.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Creates a store for the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            location: self.location(),
            source,
        }
    }
}

impl ConfigStore for FileConfigStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn read(&self) -> Result<String, ConfigError> {
        std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))
    }

    fn write(&self, contents: &str) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, contents).map_err(|e| self.io_error(e))
    }
}

/// An in-memory [`ConfigStore`].
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    contents: Mutex<Option<String>>,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `contents`.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn location(&self) -> String {
        "<memory>".to_owned()
    }

    fn exists(&self) -> bool {
        self.contents.lock().is_some()
    }

    fn read(&self) -> Result<String, ConfigError> {
        self.contents.lock().clone().ok_or_else(|| ConfigError::Io {
            location: self.location(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "store is empty"),
        })
    }

    fn write(&self, contents: &str) -> Result<(), ConfigError> {
        *self.contents.lock() = Some(contents.to_owned());
        Ok(())
    }
}
