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

//! Connection line resolution.
//!
//! Every connection id listed by a node is looked up among all nodes of the
//! snapshot, primary included. A line is drawn only when both endpoints have
//! a known position. References to ids that are not in the snapshot are
//! dropped without complaint; the feeder routinely lists neighbours it has
//! not reported yet.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::classify::ClassifiedMesh;

/// How connection lines are colored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum LineColoring {
    /// Every line uses the same color.
    Single { color: String },
    /// Lines ending at the primary node use `to_primary`, all others `other`.
    Tiered { to_primary: String, other: String },
}

impl Default for LineColoring {
    fn default() -> Self {
        LineColoring::Tiered {
            to_primary: "darkgreen".to_string(),
            other: "blue".to_string(),
        }
    }
}

impl LineColoring {
    /// Color for a line whose far endpoint is (or is not) the primary node.
    #[must_use]
    pub fn color_for(&self, far_end_is_primary: bool) -> &str {
        match self {
            LineColoring::Single { color } => color,
            LineColoring::Tiered { to_primary, other } => {
                if far_end_is_primary {
                    to_primary
                } else {
                    other
                }
            }
        }
    }
}

/// A line between two positioned nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionLine {
    pub from_id: String,
    pub to_id: String,
    /// `[lat, lon]` of the node listing the connection.
    pub from: [f64; 2],
    /// `[lat, lon]` of the referenced node.
    pub to: [f64; 2],
    pub color: String,
}

#[derive(Debug, Clone, Copy)]
struct Endpoint<'a> {
    index: usize,
    id: &'a str,
    lat: f64,
    lon: f64,
    position_known: bool,
}

impl Endpoint<'_> {
    fn is_primary(&self) -> bool {
        self.index == 0
    }
}

/// Resolve the connection lines of a classified mesh.
///
/// Mutual connections produce one line per direction unless `dedupe` is set,
/// in which case only the first direction encountered is kept.
#[must_use]
pub fn resolve_connections(
    mesh: &ClassifiedMesh<'_>,
    coloring: &LineColoring,
    dedupe: bool,
) -> Vec<ConnectionLine> {
    let primary = mesh.primary.node;
    let endpoints: Vec<(Endpoint<'_>, &[String])> = std::iter::once((
        Endpoint {
            index: 0,
            id: primary.id.as_str(),
            lat: primary.lat,
            lon: primary.lon,
            position_known: true,
        },
        primary.connections.as_slice(),
    ))
    .chain(mesh.nodes.iter().enumerate().map(|(i, classified)| {
        (
            Endpoint {
                index: i + 1,
                id: classified.node.id.as_str(),
                lat: classified.node.lat,
                lon: classified.node.lon,
                position_known: classified.position_known,
            },
            classified.node.connections.as_slice(),
        )
    }))
    .collect();

    // First occurrence wins when a snapshot repeats an id.
    let mut by_id: HashMap<&str, Endpoint<'_>> = HashMap::with_capacity(endpoints.len());
    for (endpoint, _) in &endpoints {
        by_id.entry(endpoint.id).or_insert(*endpoint);
    }

    let mut seen_pairs: HashSet<(usize, usize)> = HashSet::new();
    let mut lines = Vec::new();

    for (from, connections) in &endpoints {
        for connection in *connections {
            let Some(to) = by_id.get(connection.as_str()) else {
                continue;
            };
            if to.index == from.index || !from.position_known || !to.position_known {
                continue;
            }
            if dedupe && !seen_pairs.insert((from.index.min(to.index), from.index.max(to.index))) {
                continue;
            }

            debug!("Drawing connection {} -> {}", from.id, to.id);
            lines.push(ConnectionLine {
                from_id: from.id.to_string(),
                to_id: to.id.to_string(),
                from: [from.lat, from.lon],
                to: [to.lat, to.lon],
                color: coloring.color_for(to.is_primary()).to_string(),
            });
        }
    }

    lines
}
