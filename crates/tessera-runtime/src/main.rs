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

//! Tessera demo runtime.
//!
//! Loads a configuration, installs logging, then drives a small scene
//! through the context registry, services, signals, pools and a state
//! machine for a fixed number of ticks.

mod demo;
mod wanderer;

use anyhow::{Context as _, Result};
use clap::Parser;
use std::path::PathBuf;
use tessera_sdk::{FileConfigStore, Runtime, RuntimeConfig};
use tessera_telemetry::logging;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "tessera", version)]
#[command(about = "Runs the Tessera demo scene")]
struct Args {
    /// JSON configuration file. Missing files fall back to defaults.
    #[arg(short, long, value_name = "PATH", default_value = "tessera.json")]
    config: PathBuf,

    /// Number of ticks to run, overriding the configuration.
    #[arg(short, long, value_name = "N")]
    ticks: Option<u32>,

    /// Write the effective configuration back to the config file and exit.
    #[arg(long)]
    write_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let store = FileConfigStore::new(args.config.clone());
    let mut config = RuntimeConfig::load(&store)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(ticks) = args.ticks {
        config.ticks = ticks;
    }

    if logging::init(&config.log_filter).is_err() {
        eprintln!("tessera: a logger was already installed");
    }

    if args.write_config {
        config
            .save(&store)
            .with_context(|| format!("writing {}", args.config.display()))?;
        log::info!("Wrote configuration to {}.", args.config.display());
        return Ok(());
    }

    let ticks = config.ticks;
    let mut runtime = Runtime::new(config);
    let mut scene = demo::Scene::setup(&mut runtime).await?;
    for _ in 0..ticks {
        scene.tick(&mut runtime)?;
    }
    scene.report(&mut runtime);
    runtime.shutdown();
    Ok(())
}
