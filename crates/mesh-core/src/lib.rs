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

//! Mesh network map core.
//!
//! This library turns a mesh network snapshot into a renderer-neutral map
//! description. It is organised as independent layers that run in sequence
//! once per render cycle:
//!
//! - **Snapshot layer**: JSON snapshot model and loading with a built-in
//!   fallback network
//! - **Classifier**: recency bucket, color and position state per node
//! - **Topology**: connection lines between positioned nodes
//! - **Report**: sidebar rows for nodes without a position fix
//! - **Map**: composition of markers, lines and panels into a [`RenderableMap`]
//!
//! No state survives a cycle. Each call loads its own snapshot, derives its
//! own classification, and returns an owned map.
//!
//! # Quick Start
//!
//! ```no_run
//! use mesh_core::{render_cycle, PipelineOptions};
//! use std::path::Path;
//!
//! let map = render_cycle(
//!     Path::new("/data/mesh_data.json"),
//!     chrono::Utc::now(),
//!     &PipelineOptions::default(),
//! )
//! .expect("snapshot has a primary node");
//!
//! println!("{} markers, {} lines", map.markers.len(), map.lines.len());
//! ```
//!
//! # Using Individual Layers
//!
//! ```
//! use mesh_core::classify::{classify_all, Palette};
//! use mesh_core::snapshot::default_snapshot;
//! use mesh_core::topology::{resolve_connections, LineColoring};
//!
//! let snapshot = default_snapshot();
//! let mesh = classify_all(&snapshot, chrono::Utc::now(), &Palette::default()).unwrap();
//! let lines = resolve_connections(&mesh, &LineColoring::default(), false);
//! assert_eq!(lines.len(), 4);
//! ```

pub mod classify;
pub mod map;
pub mod report;
pub mod snapshot;
pub mod topology;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use classify::{classify, ClassifiedMesh, ClassifiedNode, Palette, PrimaryNode, RecencyBucket};
pub use map::{
    assemble, LegendEntry, LegendSymbol, Marker, MarkerIcon, Panel, RenderableMap, SitrepFraming,
};
pub use report::{UnresolvedOrder, UnresolvedRow};
pub use snapshot::{MeshSnapshot, Node, SnapshotError};
pub use topology::{resolve_connections, ConnectionLine, LineColoring};

/// Errors that abort a render cycle.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("snapshot contains no nodes; the map has no primary node to center on")]
    MissingPrimaryNode,
}

/// Display choices applied during a render cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Marker colors.
    pub palette: Palette,
    /// Connection line coloring.
    pub line_coloring: LineColoring,
    /// Collapse mutual connections into a single line.
    pub dedupe_lines: bool,
    /// Status report framing.
    pub sitrep_framing: SitrepFraming,
    /// Unresolved-node sidebar ordering.
    pub unresolved_order: UnresolvedOrder,
}

/// Run one full cycle against the snapshot file at `path`.
///
/// A missing or unreadable snapshot is replaced by the built-in sample network;
/// only a snapshot without nodes fails.
pub fn render_cycle(
    path: &Path,
    now: DateTime<Utc>,
    options: &PipelineOptions,
) -> Result<RenderableMap, MeshError> {
    let snapshot = snapshot::load(path);
    render_snapshot(&snapshot, now, options)
}

/// Classify, resolve and assemble an already loaded snapshot.
pub fn render_snapshot(
    snapshot: &MeshSnapshot,
    now: DateTime<Utc>,
    options: &PipelineOptions,
) -> Result<RenderableMap, MeshError> {
    let mesh = classify::classify_all(snapshot, now, &options.palette)?;
    let lines = resolve_connections(&mesh, &options.line_coloring, options.dedupe_lines);
    assemble(snapshot, &mesh, lines, options)
}
