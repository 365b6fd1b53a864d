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

//! Mesh snapshot model and loading.
//!
//! A snapshot is the JSON document written by the mesh feeder: a header with
//! update times and a status report, followed by the node list. The first
//! node is always the primary (local) node.
//!
//! Deserialization is deliberately lenient. Coordinates, hop counts and
//! last-heard times arrive in several shapes depending on the feeder
//! version, and a bad value in one node must never reject the whole file.

mod loader;

pub use loader::{default_snapshot, load, parse, try_load};

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Placeholder shown wherever a value is not available.
pub const NOT_AVAILABLE: &str = "N/A";

/// Errors that can occur while reading a snapshot from disk.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse snapshot {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Complete state of the mesh at one point in time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeshSnapshot {
    /// When the feeder last refreshed the file, as written by the feeder.
    #[serde(default = "not_available", deserialize_with = "display_string")]
    pub last_update: String,

    /// When the status report was generated.
    #[serde(default = "not_available", deserialize_with = "display_string")]
    pub sitrep_time: String,

    /// Status report text, one entry per line.
    #[serde(default, rename = "sitrep")]
    pub sitrep_lines: Vec<String>,

    /// All known nodes; `nodes[0]` is the primary node.
    ///
    /// Entries that cannot be read as a node (no `id`, not an object) are
    /// dropped individually.
    #[serde(default, deserialize_with = "lenient_nodes")]
    pub nodes: Vec<Node>,
}

impl MeshSnapshot {
    /// The primary node, if the snapshot has any nodes at all.
    #[must_use]
    pub fn primary(&self) -> Option<&Node> {
        self.nodes.first()
    }
}

/// A single mesh radio.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Node {
    /// Node identifier, unique within a well-formed snapshot.
    #[serde(deserialize_with = "display_string")]
    pub id: String,

    /// Latitude in degrees (0 together with `lon == 0` means no fix).
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: f64,

    /// Longitude in degrees.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lon: f64,

    /// Altitude in meters.
    #[serde(default, rename = "alt", deserialize_with = "lenient_f64")]
    pub altitude: f64,

    /// Last time the node was heard on the mesh.
    #[serde(default, rename = "lastHeard", deserialize_with = "lenient_last_heard")]
    pub last_heard: Option<DateTime<Utc>>,

    /// Hops between this node and the primary. Negative values mean unknown.
    #[serde(default, rename = "hopsAway", deserialize_with = "lenient_hops")]
    pub hops_away: Option<i64>,

    /// Identifiers of directly connected nodes.
    #[serde(default, deserialize_with = "lenient_connections")]
    pub connections: Vec<String>,
}

impl Node {
    /// Whether the node has a position fix. `(0, 0)` is the "no fix" sentinel.
    #[must_use]
    #[allow(clippy::float_cmp, reason = "exact zero is the feeder's no-fix sentinel")]
    pub fn has_position(&self) -> bool {
        !(self.lat == 0.0 && self.lon == 0.0)
    }

    /// Hop count with the negative sentinel folded into `None`.
    #[must_use]
    pub fn known_hops(&self) -> Option<i64> {
        self.hops_away.filter(|hops| *hops >= 0)
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn display_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => not_available(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()).unwrap_or(0.0))
}

fn lenient_nodes<'de, D>(deserializer: D) -> Result<Vec<Node>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        warn!("Snapshot node list is not an array; treating it as empty");
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match Node::deserialize(entry) {
            Ok(node) => Some(node),
            Err(e) => {
                warn!("Skipping unreadable node at index {index}: {e}");
                None
            }
        })
        .collect())
}

fn lenient_connections<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(id) => Some(id),
            Value::Number(n) => Some(n.to_string()),
            other => {
                debug!("Ignoring connection id {other}");
                None
            }
        })
        .collect())
}

fn lenient_hops<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn lenient_last_heard<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = parse_last_heard(&value);
    if parsed.is_none() && !is_blank(&value) {
        debug!("Ignoring malformed lastHeard value {value}");
    }
    Ok(parsed)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Interpret a last-heard value as epoch seconds.
#[allow(clippy::cast_possible_truncation, reason = "sub-second precision is not displayed")]
fn parse_last_heard(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = match value {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    if !seconds.is_finite() {
        return None;
    }
    DateTime::from_timestamp(seconds.trunc() as i64, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_from(json: &str) -> Node {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_last_heard_epoch_string() {
        let node = node_from(r#"{"id": "n", "lat": 1.0, "lon": 2.0, "lastHeard": "1700000000"}"#);
        assert_eq!(node.last_heard.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn test_last_heard_number_and_blank() {
        let node = node_from(r#"{"id": "n", "lastHeard": 1700000000.9}"#);
        assert_eq!(node.last_heard.map(|t| t.timestamp()), Some(1_700_000_000));

        let node = node_from(r#"{"id": "n", "lastHeard": ""}"#);
        assert!(node.last_heard.is_none());

        let node = node_from(r#"{"id": "n", "lastHeard": null}"#);
        assert!(node.last_heard.is_none());
    }

    #[test]
    fn test_malformed_last_heard_is_absent() {
        let node = node_from(r#"{"id": "n", "lastHeard": "yesterday"}"#);
        assert!(node.last_heard.is_none());

        let node = node_from(r#"{"id": "n", "lastHeard": ["1700000000"]}"#);
        assert!(node.last_heard.is_none());
    }

    #[test]
    fn test_optional_fields_default() {
        let node = node_from(r#"{"id": "n"}"#);
        assert_eq!(node.altitude, 0.0);
        assert!(node.connections.is_empty());
        assert!(node.hops_away.is_none());
        assert!(!node.has_position());
    }

    #[test]
    fn test_sentinel_position() {
        let node = node_from(r#"{"id": "n", "lat": 0, "lon": 0, "alt": 500}"#);
        assert!(!node.has_position());

        // Only the exact pair is the sentinel.
        let node = node_from(r#"{"id": "n", "lat": 0.0, "lon": -0.5}"#);
        assert!(node.has_position());
    }

    #[test]
    fn test_negative_hops_is_unknown() {
        let node = node_from(r#"{"id": "n", "hopsAway": -1}"#);
        assert_eq!(node.hops_away, Some(-1));
        assert_eq!(node.known_hops(), None);

        let node = node_from(r#"{"id": "n", "hopsAway": "2"}"#);
        assert_eq!(node.known_hops(), Some(2));
    }

    #[test]
    fn test_connections_null_or_not_a_list() {
        let node = node_from(r#"{"id": "n", "connections": null}"#);
        assert!(node.connections.is_empty());

        let node = node_from(r#"{"id": "n", "connections": "relay"}"#);
        assert!(node.connections.is_empty());
    }

    #[test]
    fn test_connection_ids_are_normalized() {
        let node = node_from(r#"{"id": "n", "connections": ["relay", 42, null, {"id": "x"}]}"#);
        assert_eq!(node.connections, vec!["relay", "42"]);
    }

    #[test]
    fn test_bad_node_does_not_reject_snapshot() {
        let snapshot: MeshSnapshot = serde_json::from_str(
            r#"{"nodes": [
                {"id": "base", "lat": 1.0, "lon": 2.0, "connections": ["relay"]},
                {"lat": 3.0, "lon": 4.0},
                "garbage",
                {"id": "relay", "lat": 5.0, "lon": 6.0, "connections": null}
            ]}"#,
        )
        .unwrap();

        let ids: Vec<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["base", "relay"]);
        assert!(snapshot.nodes[1].connections.is_empty());
    }

    #[test]
    fn test_node_list_not_an_array() {
        let snapshot: MeshSnapshot = serde_json::from_str(r#"{"nodes": null}"#).unwrap();
        assert!(snapshot.nodes.is_empty());
    }

    #[test]
    fn test_snapshot_header_defaults() {
        let snapshot: MeshSnapshot = serde_json::from_str(r#"{"nodes": []}"#).unwrap();
        assert_eq!(snapshot.last_update, NOT_AVAILABLE);
        assert_eq!(snapshot.sitrep_time, NOT_AVAILABLE);
        assert!(snapshot.sitrep_lines.is_empty());
        assert!(snapshot.primary().is_none());
    }
}
