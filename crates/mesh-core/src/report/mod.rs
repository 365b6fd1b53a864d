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

//! Sidebar rows for nodes without a position fix.

use serde::{Deserialize, Serialize};

use crate::classify::ClassifiedNode;
use crate::snapshot::NOT_AVAILABLE;

/// Row ordering for the unresolved-node sidebar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedOrder {
    /// Most recently heard first, then most hops away. Nodes never heard go last.
    #[default]
    Recency,
    /// Snapshot order.
    Insertion,
}

/// One sidebar row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedRow {
    pub color: String,
    pub id: String,
    pub last_heard: String,
    pub hops_away: String,
    /// Connection ids joined with `", "`.
    pub connections: String,
}

/// Build sidebar rows for `nodes`, which should all lack a position.
#[must_use]
pub fn report(nodes: &[&ClassifiedNode<'_>], order: UnresolvedOrder) -> Vec<UnresolvedRow> {
    let mut ordered: Vec<&ClassifiedNode<'_>> = nodes.to_vec();

    if order == UnresolvedOrder::Recency {
        // Stable sort keeps snapshot order among full ties.
        ordered.sort_by(|a, b| {
            b.node
                .last_heard
                .cmp(&a.node.last_heard)
                .then_with(|| b.node.known_hops().cmp(&a.node.known_hops()))
        });
    }

    ordered
        .into_iter()
        .map(|classified| UnresolvedRow {
            color: classified.color.clone(),
            id: classified.node.id.clone(),
            last_heard: classified.last_heard_label.clone(),
            hops_away: classified
                .node
                .known_hops()
                .map_or_else(|| NOT_AVAILABLE.to_string(), |hops| hops.to_string()),
            connections: classified.node.connections.join(", "),
        })
        .collect()
}
