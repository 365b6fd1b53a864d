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

//! Map assembly.
//!
//! Composes classified nodes and resolved connection lines into a
//! [`RenderableMap`]: everything a renderer needs to draw one page, with no
//! further reference to the snapshot. Marker order matters only for stacking;
//! the primary marker is added last so it draws on top.
//!
//! A secondary node that lists no connections gets a warning glyph in its
//! recency color, so isolated radios stand out from connected ones.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::classify::{ClassifiedMesh, ClassifiedNode, RecencyBucket};
use crate::report::{report, UnresolvedRow};
use crate::snapshot::{MeshSnapshot, NOT_AVAILABLE};
use crate::topology::{ConnectionLine, LineColoring};
use crate::{MeshError, PipelineOptions};

/// How the status report text is framed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SitrepFraming {
    /// Drop the first and last lines (the feeder's banner lines).
    #[default]
    Trimmed,
    /// Show every line.
    Full,
}

impl SitrepFraming {
    /// Apply this framing to the raw report lines.
    #[must_use]
    pub fn apply(self, lines: &[String]) -> Vec<String> {
        match self {
            SitrepFraming::Full => lines.to_vec(),
            SitrepFraming::Trimmed if lines.len() > 2 => lines[1..lines.len() - 1].to_vec(),
            SitrepFraming::Trimmed => Vec::new(),
        }
    }
}

/// Color of the legend glyph explaining the warning marker. The markers
/// themselves keep their recency color.
const ISOLATED_LEGEND_COLOR: &str = "black";

/// Marker glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerIcon {
    Circle,
    Star,
    /// Secondary node without connections.
    Warning,
}

/// Glyph drawn next to a legend label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendSymbol {
    Dot,
    Star,
    Warning,
    Line,
}

/// A node marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub node_id: String,
    pub lat: f64,
    pub lon: f64,
    pub color: String,
    pub icon: MarkerIcon,
    /// Popup text, one entry per line, unescaped.
    pub popup: Vec<String>,
}

/// One color-to-meaning legend line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub color: String,
    pub label: String,
    pub symbol: LegendSymbol,
}

/// A fixed overlay drawn on top of the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Panel {
    Legend { entries: Vec<LegendEntry> },
    LastUpdated { timestamp: String },
    StatusReport { time: String, lines: Vec<String> },
    Unresolved { rows: Vec<UnresolvedRow> },
}

/// Everything needed to render one map page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderableMap {
    pub center_lat: f64,
    pub center_lon: f64,
    pub markers: Vec<Marker>,
    pub lines: Vec<ConnectionLine>,
    pub panels: Vec<Panel>,
}

impl RenderableMap {
    /// The marker for `node_id`, if one was placed.
    #[must_use]
    pub fn marker(&self, node_id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.node_id == node_id)
    }

    /// Rows of the unresolved-node panel.
    #[must_use]
    pub fn unresolved_rows(&self) -> &[UnresolvedRow] {
        self.panels
            .iter()
            .find_map(|panel| match panel {
                Panel::Unresolved { rows } => Some(rows.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Entries of the legend panel.
    #[must_use]
    pub fn legend(&self) -> &[LegendEntry] {
        self.panels
            .iter()
            .find_map(|panel| match panel {
                Panel::Legend { entries } => Some(entries.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Assemble the map for `snapshot` from its classified nodes and lines.
pub fn assemble(
    snapshot: &MeshSnapshot,
    mesh: &ClassifiedMesh<'_>,
    lines: Vec<ConnectionLine>,
    options: &PipelineOptions,
) -> Result<RenderableMap, MeshError> {
    let primary_node = snapshot.primary().ok_or(MeshError::MissingPrimaryNode)?;
    info!(
        "Creating map centered around {} at {}, {}",
        primary_node.id, primary_node.lat, primary_node.lon
    );

    let (positioned, unpositioned): (Vec<&ClassifiedNode<'_>>, Vec<&ClassifiedNode<'_>>) =
        mesh.nodes.iter().partition(|n| n.position_known);

    let mut markers: Vec<Marker> = positioned
        .iter()
        .map(|classified| {
            debug!("Adding marker for {}", classified.node.id);
            secondary_marker(classified)
        })
        .collect();

    let primary = &mesh.primary;
    markers.push(Marker {
        node_id: primary.node.id.clone(),
        lat: primary.node.lat,
        lon: primary.node.lon,
        color: primary.color.clone(),
        icon: MarkerIcon::Star,
        popup: vec![
            format!("Node ID: {}", primary.node.id),
            format!("Altitude: {}m", primary.display_altitude),
        ],
    });

    for node in &unpositioned {
        debug!("{} has no position fix; listing in sidebar", node.node.id);
    }

    let isolated_in_use = markers.iter().any(|m| m.icon == MarkerIcon::Warning);
    let panels = vec![
        Panel::Legend {
            entries: legend_entries(mesh, options, isolated_in_use, !lines.is_empty()),
        },
        Panel::LastUpdated {
            timestamp: snapshot.last_update.clone(),
        },
        Panel::StatusReport {
            time: snapshot.sitrep_time.clone(),
            lines: options.sitrep_framing.apply(&snapshot.sitrep_lines),
        },
        Panel::Unresolved {
            rows: report(&unpositioned, options.unresolved_order),
        },
    ];

    info!(
        "Assembled map with {} markers, {} lines, {} nodes without position",
        markers.len(),
        lines.len(),
        unpositioned.len()
    );

    Ok(RenderableMap {
        center_lat: primary_node.lat,
        center_lon: primary_node.lon,
        markers,
        lines,
        panels,
    })
}

fn secondary_marker(classified: &ClassifiedNode<'_>) -> Marker {
    let node = classified.node;
    let hops = node
        .known_hops()
        .map_or_else(|| NOT_AVAILABLE.to_string(), |hops| hops.to_string());

    let icon = if node.connections.is_empty() {
        debug!("{} lists no connections", node.id);
        MarkerIcon::Warning
    } else {
        MarkerIcon::Circle
    };

    Marker {
        node_id: node.id.clone(),
        lat: node.lat,
        lon: node.lon,
        color: classified.color.clone(),
        icon,
        popup: vec![
            format!("Node ID: {}", node.id),
            format!("Altitude: {}m", node.altitude),
            format!("Last heard: {}", classified.last_heard_label),
            format!("Hops away: {hops}"),
        ],
    }
}

fn legend_entry(color: &str, label: &str, symbol: LegendSymbol) -> LegendEntry {
    LegendEntry {
        color: color.to_string(),
        label: label.to_string(),
        symbol,
    }
}

fn legend_entries(
    mesh: &ClassifiedMesh<'_>,
    options: &PipelineOptions,
    isolated_in_use: bool,
    lines_in_use: bool,
) -> Vec<LegendEntry> {
    let mut entries = vec![legend_entry(&mesh.primary.color, "Primary node", LegendSymbol::Star)];
    entries.extend(mesh.buckets_in_use().into_iter().map(|bucket: RecencyBucket| {
        legend_entry(
            options.palette.color_for(bucket),
            bucket.description(),
            LegendSymbol::Dot,
        )
    }));

    if isolated_in_use {
        entries.push(legend_entry(
            ISOLATED_LEGEND_COLOR,
            "No connections",
            LegendSymbol::Warning,
        ));
    }

    if lines_in_use {
        match &options.line_coloring {
            LineColoring::Single { color } => {
                entries.push(legend_entry(color, "Connection", LegendSymbol::Line));
            }
            LineColoring::Tiered { to_primary, other } => {
                entries.push(legend_entry(to_primary, "Link to primary", LegendSymbol::Line));
                entries.push(legend_entry(other, "Link between nodes", LegendSymbol::Line));
            }
        }
    }
    entries
}
