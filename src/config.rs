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

//! Application configuration management.
//!
//! Configuration is stored in TOML format through `confy`. Every field has a
//! serde default, so a partial or missing file yields a usable configuration.
//! The snapshot path can be overridden with the `MESH_DATA_PATH` environment
//! variable; command-line flags take precedence over both.

use std::path::PathBuf;
use std::time::Duration;

use log::warn;
use mesh_core::PipelineOptions;
use serde::{Deserialize, Serialize};

/// Application name used for the config file location.
const APP_NAME: &str = "meshmap";

/// Default location of the mesh snapshot written by the feeder
pub const DEFAULT_DATA_PATH: &str = "/data/mesh_data.json";

/// Environment variable overriding the snapshot location
pub const DATA_PATH_ENV: &str = "MESH_DATA_PATH";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Path of the JSON mesh snapshot
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Directory receiving rendered map artifacts
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Seconds between snapshot polls in watch mode
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Number of rendered artifacts kept on disk
    #[serde(default = "default_keep_artifacts")]
    pub keep_artifacts: usize,

    /// Listen address for the HTTP server
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Initial map zoom level
    #[serde(default = "default_zoom")]
    pub zoom_start: u8,

    /// Classification and assembly choices
    #[serde(default)]
    pub map: PipelineOptions,
}

// Default value functions for serde
fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn default_output_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(|| PathBuf::from("templates"), |dir| dir.join(APP_NAME).join("maps"))
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_keep_artifacts() -> usize {
    5
}

fn default_listen_address() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_zoom() -> u8 {
    12
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            output_dir: default_output_dir(),
            poll_interval_secs: default_poll_interval_secs(),
            keep_artifacts: default_keep_artifacts(),
            listen_address: default_listen_address(),
            zoom_start: default_zoom(),
            map: PipelineOptions::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, "config")
    }

    /// Load configuration, falling back to defaults on error, then apply
    /// the environment override.
    pub fn load_or_default() -> Self {
        let config = Self::load().unwrap_or_else(|e| {
            warn!("Failed to load configuration ({e}); using defaults");
            Self::default()
        });
        config.with_env_override(std::env::var_os(DATA_PATH_ENV).map(PathBuf::from))
    }

    /// Replace the snapshot path when an override is present
    #[must_use]
    pub fn with_env_override(mut self, data_path: Option<PathBuf>) -> Self {
        if let Some(path) = data_path.filter(|p| !p.as_os_str().is_empty()) {
            self.data_path = path;
        }
        self
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, "config", self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, "config")
    }

    /// Poll interval as a duration, never shorter than one second
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_core::{LineColoring, SitrepFraming, UnresolvedOrder};

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"poll_interval_secs": 30}"#).unwrap();
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(config.keep_artifacts, 5);
        assert_eq!(config.map, PipelineOptions::default());
    }

    #[test]
    fn test_map_options_from_config() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "map": {
                    "dedupe_lines": true,
                    "sitrep_framing": "full",
                    "unresolved_order": "insertion",
                    "line_coloring": {"policy": "single", "color": "black"},
                    "palette": {"primary": "darkblue"}
                }
            }"#,
        )
        .unwrap();

        assert!(config.map.dedupe_lines);
        assert_eq!(config.map.sitrep_framing, SitrepFraming::Full);
        assert_eq!(config.map.unresolved_order, UnresolvedOrder::Insertion);
        assert_eq!(
            config.map.line_coloring,
            LineColoring::Single {
                color: "black".to_string()
            }
        );
        assert_eq!(config.map.palette.primary, "darkblue");
        assert_eq!(config.map.palette.seen_last_day, "green");
    }

    #[test]
    fn test_env_override() {
        let config = AppConfig::default().with_env_override(Some(PathBuf::from("/tmp/mesh.json")));
        assert_eq!(config.data_path, PathBuf::from("/tmp/mesh.json"));

        let config = AppConfig::default().with_env_override(Some(PathBuf::new()));
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));

        let config = AppConfig::default().with_env_override(None);
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
    }

    #[test]
    fn test_poll_interval_floor() {
        let config = AppConfig {
            poll_interval_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}
