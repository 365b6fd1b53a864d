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

//! Rendered map storage.
//!
//! Each cycle writes `map_<timestamp>.html` so successive renders never
//! collide. Files are written to a temporary name and renamed into place;
//! older artifacts beyond the retention count are removed afterwards.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

const ARTIFACT_PREFIX: &str = "map_";
const ARTIFACT_SUFFIX: &str = ".html";

/// Directory of timestamped map artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    keep: usize,
}

impl ArtifactStore {
    /// Create a store in `dir` retaining the newest `keep` artifacts (at least one).
    pub fn new(dir: PathBuf, keep: usize) -> Self {
        Self {
            dir,
            keep: keep.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name of the artifact rendered at `at`.
    pub fn artifact_name(at: DateTime<Utc>) -> String {
        format!(
            "{ARTIFACT_PREFIX}{}{ARTIFACT_SUFFIX}",
            at.format("%Y%m%d_%H%M%S_%3f")
        )
    }

    /// Write `html` as the artifact for `at` and prune old artifacts.
    pub fn write(&self, html: &str, at: DateTime<Utc>) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let name = Self::artifact_name(at);
        let path = self.dir.join(&name);
        let tmp_path = self.dir.join(format!(".{name}.tmp"));

        fs::write(&tmp_path, html)?;
        fs::rename(&tmp_path, &path)?;
        info!("Wrote map to {}", path.display());

        match self.cleanup() {
            Ok(0) => {}
            Ok(removed) => debug!("Removed {removed} stale map artifacts"),
            Err(e) => warn!("Failed to clean up old maps in {}: {e}", self.dir.display()),
        }

        Ok(path)
    }

    /// Artifacts currently on disk, newest first.
    pub fn list(&self) -> io::Result<Vec<PathBuf>> {
        let mut artifacts: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| {
                        name.starts_with(ARTIFACT_PREFIX) && name.ends_with(ARTIFACT_SUFFIX)
                    })
            })
            .collect();

        // Timestamped names sort chronologically.
        artifacts.sort_unstable_by(|a, b| b.file_name().cmp(&a.file_name()));
        Ok(artifacts)
    }

    /// Remove artifacts beyond the retention count. Returns how many were removed.
    pub fn cleanup(&self) -> io::Result<usize> {
        let stale: Vec<PathBuf> = self.list()?.into_iter().skip(self.keep).collect();
        for path in &stale {
            fs::remove_file(path)?;
        }
        Ok(stale.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    #[test]
    fn test_artifact_name() {
        assert_eq!(ArtifactStore::artifact_name(at(5)), "map_20240601_120005_000.html");
    }

    #[test]
    fn test_write_and_prune() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("maps"), 2);

        for i in 0..4 {
            store.write(&format!("<html>{i}</html>"), at(i)).unwrap();
        }
        fs::write(dir.path().join("maps").join("notes.txt"), "keep me").unwrap();

        let remaining = store.list().unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(
            remaining[0].file_name().unwrap().to_str().unwrap(),
            "map_20240601_120003_000.html"
        );
        assert_eq!(fs::read_to_string(&remaining[1]).unwrap(), "<html>2</html>");
        assert!(dir.path().join("maps").join("notes.txt").exists());
    }

    #[test]
    fn test_zero_retention_keeps_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf(), 0);
        let path = store.write("<html></html>", at(0)).unwrap();
        assert!(path.exists());
        assert_eq!(store.list().unwrap(), vec![path]);
    }
}
