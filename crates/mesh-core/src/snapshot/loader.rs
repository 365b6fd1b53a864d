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

//! Reading snapshots from disk with a built-in fallback.

use std::fs;
use std::path::Path;

use log::{info, warn};

use super::{MeshSnapshot, Node, SnapshotError, NOT_AVAILABLE};

/// Load the snapshot at `path`, falling back to the built-in sample network.
///
/// Never fails: read and parse errors are logged as warnings and replaced by
/// [`default_snapshot`].
#[must_use]
pub fn load(path: &Path) -> MeshSnapshot {
    match try_load(path) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("{e}; using built-in sample network");
            default_snapshot()
        }
    }
}

/// Load the snapshot at `path`, reporting failures to the caller.
pub fn try_load(path: &Path) -> Result<MeshSnapshot, SnapshotError> {
    info!("Reading mesh data from {}", path.display());

    let text = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot = parse(&text).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "Loaded {} nodes from {} (last update {})",
        snapshot.nodes.len(),
        path.display(),
        snapshot.last_update
    );
    Ok(snapshot)
}

/// Parse a snapshot from JSON text.
pub fn parse(text: &str) -> Result<MeshSnapshot, serde_json::Error> {
    serde_json::from_str(text)
}

/// The three-node sample network used when no snapshot is available.
#[must_use]
pub fn default_snapshot() -> MeshSnapshot {
    MeshSnapshot {
        last_update: NOT_AVAILABLE.to_string(),
        sitrep_time: NOT_AVAILABLE.to_string(),
        sitrep_lines: Vec::new(),
        nodes: vec![
            sample_node("node1", 37.7749, -122.4194, 10.0, &["node2", "node3"]),
            sample_node("node2", 37.8044, -122.2711, 20.0, &["node1"]),
            sample_node("node3", 37.6879, -122.4702, 15.0, &["node1"]),
        ],
    }
}

fn sample_node(id: &str, lat: f64, lon: f64, altitude: f64, connections: &[&str]) -> Node {
    Node {
        id: id.to_string(),
        lat,
        lon,
        altitude,
        last_heard: None,
        hops_away: None,
        connections: connections.iter().map(|c| (*c).to_string()).collect(),
    }
}
