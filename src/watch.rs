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

//! Snapshot polling.
//!
//! Re-renders the map on every tick of a fixed interval. Recency colors and
//! "last heard" labels depend on the current time, so an unchanged snapshot
//! still gets a fresh render. The file is hashed only to report when the
//! feeder has rewritten it; touching the file without changing it is not
//! reported.

use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info, warn};
use sha2::{Digest, Sha256};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::service::MapService;

/// Digest of the snapshot file, or `None` when it cannot be read.
type SnapshotDigest = Option<Vec<u8>>;

/// Tracks the last observed snapshot digest.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<SnapshotDigest>,
}

impl ChangeDetector {
    /// Record `digest`; returns whether it differs from the previous one.
    ///
    /// The first observation always counts as a change.
    pub fn observe(&mut self, digest: SnapshotDigest) -> bool {
        if self.last.as_ref() == Some(&digest) {
            return false;
        }
        self.last = Some(digest);
        true
    }
}

async fn snapshot_digest(path: &Path) -> SnapshotDigest {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(Sha256::digest(&bytes).to_vec()),
        Err(e) => {
            debug!("Cannot read {}: {e}", path.display());
            None
        }
    }
}

/// Poll the snapshot until `cancel_token` fires.
pub async fn run(service: Arc<MapService>, cancel_token: CancellationToken) {
    let path = service.config().data_path.clone();
    let period = service.config().poll_interval();
    info!(
        "Watching {} every {} seconds",
        path.display(),
        period.as_secs()
    );

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut detector = ChangeDetector::default();

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            () = cancel_token.cancelled() => {
                info!("Watcher stopped");
                return;
            }
        }

        let first = detector.last.is_none();
        let digest = snapshot_digest(&path).await;
        let missing = digest.is_none();
        match (detector.observe(digest), first, missing) {
            (false, _, _) => debug!("{} unchanged", path.display()),
            (true, true, _) => {}
            (true, false, true) => warn!("{} is no longer readable", path.display()),
            (true, false, false) => info!("{} modified", path.display()),
        }

        match service.run_cycle().await {
            Ok(output) => info!(
                "Rendered {} markers and {} lines to {}",
                output.map.markers.len(),
                output.map.lines.len(),
                output.artifact.display()
            ),
            Err(e) => error!("Render cycle failed: {e:#}"),
        }
    }
}
