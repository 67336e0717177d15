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

//! Process-wide logger setup.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Default filter used when neither `RUST_LOG` nor a configured filter is set.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global logger.
///
/// `RUST_LOG` takes precedence over `filter`. Returns an error if a logger is
/// already installed, which callers may treat as harmless.
pub fn init(filter: &str) -> Result<(), log::SetLoggerError> {
    builder(filter).try_init()
}

/// Same as [`init`], for tests: output is captured by the test harness and a
/// second call is silently ignored.
pub fn init_for_tests() {
    let _ = builder("debug").is_test(true).try_init();
}

fn builder(filter: &str) -> Builder {
    let filter = if filter.trim().is_empty() {
        DEFAULT_FILTER
    } else {
        filter
    };
    let mut builder = Builder::from_env(Env::default().default_filter_or(filter));
    builder.filter_module("tokio", LevelFilter::Warn);
    builder
}
