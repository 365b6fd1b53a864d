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

//! Node classification.
//!
//! Turns raw snapshot nodes into display state: a recency bucket driving the
//! marker color, a human-readable "last heard" label, and whether the node
//! has a usable position. The primary node is not classified; it gets a
//! fixed color and a display altitude instead.
//!
//! The recency bucket and the label are computed independently. The bucket
//! uses fixed one-day and one-week thresholds on the exact age, while the
//! label picks the largest whole unit of elapsed seconds.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::{MeshSnapshot, Node, NOT_AVAILABLE};
use crate::MeshError;

/// Offset added to the primary node's altitude for display, in meters.
pub const PRIMARY_ALTITUDE_OFFSET: f64 = 100.0;

// Label unit table: (exclusive upper bound, divisor, unit name), in seconds.
const AGE_UNITS: [(i64, i64, &str); 7] = [
    (60, 1, "second"),
    (3_600, 60, "minute"),
    (86_400, 3_600, "hour"),
    (604_800, 86_400, "day"),
    (2_592_000, 604_800, "week"),
    (31_536_000, 2_592_000, "month"),
    (i64::MAX, 31_536_000, "year"),
];

/// How recently a node was heard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyBucket {
    SeenToday,
    SeenThisWeek,
    SeenOlder,
    Unknown,
}

impl RecencyBucket {
    /// All buckets in legend order.
    pub const ALL: [RecencyBucket; 4] = [
        RecencyBucket::SeenToday,
        RecencyBucket::SeenThisWeek,
        RecencyBucket::SeenOlder,
        RecencyBucket::Unknown,
    ];

    /// Bucket for a node last heard `age` ago.
    #[must_use]
    pub fn from_age(age: Duration) -> Self {
        if age < Duration::days(1) {
            RecencyBucket::SeenToday
        } else if age < Duration::days(7) {
            RecencyBucket::SeenThisWeek
        } else {
            RecencyBucket::SeenOlder
        }
    }

    /// Legend text for this bucket.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            RecencyBucket::SeenToday => "Seen in the last day",
            RecencyBucket::SeenThisWeek => "Seen in the last week",
            RecencyBucket::SeenOlder => "Seen over a week ago",
            RecencyBucket::Unknown => "Never heard / no timestamp",
        }
    }
}

/// Marker colors for each display state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub primary: String,
    pub seen_last_day: String,
    pub seen_last_week: String,
    pub seen_over_week: String,
    pub no_last_heard: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: "purple".to_string(),
            seen_last_day: "green".to_string(),
            seen_last_week: "orange".to_string(),
            seen_over_week: "red".to_string(),
            no_last_heard: "gray".to_string(),
        }
    }
}

impl Palette {
    /// Color for a recency bucket.
    #[must_use]
    pub fn color_for(&self, bucket: RecencyBucket) -> &str {
        match bucket {
            RecencyBucket::SeenToday => &self.seen_last_day,
            RecencyBucket::SeenThisWeek => &self.seen_last_week,
            RecencyBucket::SeenOlder => &self.seen_over_week,
            RecencyBucket::Unknown => &self.no_last_heard,
        }
    }
}

/// A non-primary node with its derived display state.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedNode<'a> {
    pub node: &'a Node,
    pub recency: RecencyBucket,
    pub color: String,
    pub last_heard_label: String,
    pub position_known: bool,
}

/// The primary node as displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryNode<'a> {
    pub node: &'a Node,
    pub color: String,
    /// Snapshot altitude plus [`PRIMARY_ALTITUDE_OFFSET`].
    pub display_altitude: f64,
}

impl<'a> PrimaryNode<'a> {
    #[must_use]
    pub fn new(node: &'a Node, palette: &Palette) -> Self {
        Self {
            node,
            color: palette.primary.clone(),
            display_altitude: node.altitude + PRIMARY_ALTITUDE_OFFSET,
        }
    }
}

/// Every node of a snapshot after classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedMesh<'a> {
    pub primary: PrimaryNode<'a>,
    /// Non-primary nodes in snapshot order.
    pub nodes: Vec<ClassifiedNode<'a>>,
}

impl ClassifiedMesh<'_> {
    /// Recency buckets present among the classified nodes, in legend order.
    #[must_use]
    pub fn buckets_in_use(&self) -> Vec<RecencyBucket> {
        RecencyBucket::ALL
            .into_iter()
            .filter(|bucket| self.nodes.iter().any(|n| n.recency == *bucket))
            .collect()
    }
}

/// Classify a single non-primary node as of `now`.
#[must_use]
pub fn classify<'a>(node: &'a Node, now: DateTime<Utc>, palette: &Palette) -> ClassifiedNode<'a> {
    let (recency, last_heard_label) = match node.last_heard {
        Some(heard) => {
            let age = now - heard;
            (RecencyBucket::from_age(age), humanize_age(age.num_seconds()))
        }
        None => (RecencyBucket::Unknown, NOT_AVAILABLE.to_string()),
    };

    ClassifiedNode {
        node,
        recency,
        color: palette.color_for(recency).to_string(),
        last_heard_label,
        position_known: node.has_position(),
    }
}

/// Classify every node of `snapshot`, separating out the primary.
pub fn classify_all<'a>(
    snapshot: &'a MeshSnapshot,
    now: DateTime<Utc>,
    palette: &Palette,
) -> Result<ClassifiedMesh<'a>, MeshError> {
    let (primary, rest) = snapshot
        .nodes
        .split_first()
        .ok_or(MeshError::MissingPrimaryNode)?;

    Ok(ClassifiedMesh {
        primary: PrimaryNode::new(primary, palette),
        nodes: rest.iter().map(|node| classify(node, now, palette)).collect(),
    })
}

/// Describe an elapsed time using the largest whole unit that fits.
///
/// Negative ages (clock skew between feeder and renderer) read as zero.
#[must_use]
pub fn humanize_age(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (_, divisor, unit) = AGE_UNITS
        .iter()
        .copied()
        .find(|(limit, _, _)| seconds < *limit)
        .unwrap_or(AGE_UNITS[AGE_UNITS.len() - 1]);

    let count = seconds / divisor;
    let plural = if count == 1 { "" } else { "s" };
    format!("{count} {unit}{plural} ago")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn node(id: &str, lat: f64, lon: f64, last_heard: Option<DateTime<Utc>>) -> Node {
        Node {
            id: id.to_string(),
            lat,
            lon,
            altitude: 50.0,
            last_heard,
            hops_away: None,
            connections: Vec::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_last_heard_is_unknown() {
        let palette = Palette::default();
        let n = node("a", 1.0, 1.0, None);
        let classified = classify(&n, now(), &palette);
        assert_eq!(classified.recency, RecencyBucket::Unknown);
        assert_eq!(classified.color, palette.no_last_heard);
        assert_eq!(classified.last_heard_label, "N/A");
    }

    #[test]
    fn test_23_hours_is_today() {
        let n = node("a", 1.0, 1.0, Some(now() - Duration::hours(23)));
        let classified = classify(&n, now(), &Palette::default());
        assert_eq!(classified.recency, RecencyBucket::SeenToday);
        assert_eq!(classified.color, "green");
        assert_eq!(classified.last_heard_label, "23 hours ago");
    }

    #[test]
    fn test_30_hours_is_this_week() {
        let n = node("a", 1.0, 1.0, Some(now() - Duration::hours(30)));
        let classified = classify(&n, now(), &Palette::default());
        assert_eq!(classified.recency, RecencyBucket::SeenThisWeek);
        assert_eq!(classified.color, "orange");
        assert_eq!(classified.last_heard_label, "1 day ago");
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(RecencyBucket::from_age(Duration::days(1)), RecencyBucket::SeenThisWeek);
        assert_eq!(
            RecencyBucket::from_age(Duration::days(7) - Duration::seconds(1)),
            RecencyBucket::SeenThisWeek
        );
        assert_eq!(RecencyBucket::from_age(Duration::days(7)), RecencyBucket::SeenOlder);
        assert_eq!(RecencyBucket::from_age(Duration::seconds(-30)), RecencyBucket::SeenToday);
    }

    #[test]
    fn test_old_node_is_older() {
        let n = node("a", 1.0, 1.0, Some(now() - Duration::days(40)));
        let classified = classify(&n, now(), &Palette::default());
        assert_eq!(classified.recency, RecencyBucket::SeenOlder);
        assert_eq!(classified.color, "red");
        assert_eq!(classified.last_heard_label, "1 month ago");
    }

    #[test]
    fn test_sentinel_position_unknown_regardless_of_recency() {
        let n = node("a", 0.0, 0.0, Some(now() - Duration::minutes(5)));
        let classified = classify(&n, now(), &Palette::default());
        assert!(!classified.position_known);
        assert_eq!(classified.recency, RecencyBucket::SeenToday);
    }

    #[test]
    fn test_humanize_age_units() {
        assert_eq!(humanize_age(0), "0 seconds ago");
        assert_eq!(humanize_age(1), "1 second ago");
        assert_eq!(humanize_age(59), "59 seconds ago");
        assert_eq!(humanize_age(60), "1 minute ago");
        assert_eq!(humanize_age(3_599), "59 minutes ago");
        assert_eq!(humanize_age(3_600), "1 hour ago");
        assert_eq!(humanize_age(86_400), "1 day ago");
        assert_eq!(humanize_age(604_799), "6 days ago");
        assert_eq!(humanize_age(604_800), "1 week ago");
        assert_eq!(humanize_age(2_591_999), "4 weeks ago");
        assert_eq!(humanize_age(2_592_000), "1 month ago");
        assert_eq!(humanize_age(31_535_999), "12 months ago");
        assert_eq!(humanize_age(31_536_000), "1 year ago");
        assert_eq!(humanize_age(-10), "0 seconds ago");
    }

    #[test]
    fn test_primary_is_not_classified() {
        let snapshot = MeshSnapshot {
            last_update: "N/A".to_string(),
            sitrep_time: "N/A".to_string(),
            sitrep_lines: Vec::new(),
            nodes: vec![node("p", 0.0, 0.0, None), node("b", 1.0, 1.0, None)],
        };
        let palette = Palette::default();
        let mesh = classify_all(&snapshot, now(), &palette).unwrap();

        assert_eq!(mesh.primary.node.id, "p");
        assert_eq!(mesh.primary.color, "purple");
        assert!((mesh.primary.display_altitude - 150.0).abs() < f64::EPSILON);
        assert_eq!(mesh.nodes.len(), 1);
        assert_eq!(mesh.nodes[0].node.id, "b");
        // The snapshot itself is left untouched.
        assert!((snapshot.nodes[0].altitude - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_classify_all_empty_snapshot() {
        let snapshot = MeshSnapshot {
            last_update: "N/A".to_string(),
            sitrep_time: "N/A".to_string(),
            sitrep_lines: Vec::new(),
            nodes: Vec::new(),
        };
        assert!(matches!(
            classify_all(&snapshot, now(), &Palette::default()),
            Err(MeshError::MissingPrimaryNode)
        ));
    }
}
