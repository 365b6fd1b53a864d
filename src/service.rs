// Copyright 2025 Chris Custine
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

//! Render cycle orchestration.
//!
//! Ties the core pipeline to the page renderer and the artifact store. Cycles
//! are serialized through a single async mutex, so the watcher and HTTP
//! requests never interleave writes to the output directory. Snapshot reads
//! and artifact writes run on the blocking pool.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mesh_core::{render_cycle, RenderableMap};
use tokio::sync::Mutex;

use crate::artifacts::ArtifactStore;
use crate::config::AppConfig;
use crate::render::render_page;

/// Result of one completed render cycle.
#[derive(Debug)]
pub struct CycleOutput {
    pub map: RenderableMap,
    pub html: String,
    pub artifact: PathBuf,
}

/// Runs render cycles for one configuration.
#[derive(Debug)]
pub struct MapService {
    config: AppConfig,
    store: ArtifactStore,
    cycle_lock: Mutex<()>,
}

impl MapService {
    pub fn new(config: AppConfig) -> Self {
        let store = ArtifactStore::new(config.output_dir.clone(), config.keep_artifacts);
        Self {
            config,
            store,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load, classify and assemble without writing anything.
    ///
    /// A snapshot without nodes fails with [`mesh_core::MeshError::MissingPrimaryNode`].
    pub async fn build_map(&self) -> Result<RenderableMap> {
        let data_path = self.config.data_path.clone();
        let options = self.config.map.clone();
        let map = tokio::task::spawn_blocking(move || {
            render_cycle(&data_path, Utc::now(), &options)
        })
        .await
        .context("map task failed")??;
        Ok(map)
    }

    /// Run a full cycle: build the map, render the page and store it.
    pub async fn run_cycle(&self) -> Result<CycleOutput> {
        let _guard = self.cycle_lock.lock().await;

        let config = self.config.clone();
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || write_cycle(&config, &store, Utc::now()))
            .await
            .context("render task failed")?
    }
}

fn write_cycle(config: &AppConfig, store: &ArtifactStore, now: DateTime<Utc>) -> Result<CycleOutput> {
    let map = render_cycle(&config.data_path, now, &config.map)?;
    let html = render_page(&map, config.zoom_start).context("failed to render map page")?;
    let artifact = store
        .write(&html, now)
        .with_context(|| format!("failed to write map to {}", store.dir().display()))?;

    Ok(CycleOutput {
        map,
        html,
        artifact,
    })
}
