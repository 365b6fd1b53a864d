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

mod artifacts;
mod config;
mod render;
mod server;
mod service;
mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use config::AppConfig;
use service::MapService;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "meshmap", version, about = "Render mesh network snapshots as interactive maps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the current snapshot once
    Render {
        #[command(flatten)]
        paths: PathArgs,
        /// Print the assembled map as JSON instead of writing HTML
        #[arg(long)]
        json: bool,
        /// Open the rendered page in the default browser
        #[arg(long, conflicts_with = "json")]
        open: bool,
    },
    /// Re-render the map on a fixed interval
    Watch {
        #[command(flatten)]
        paths: PathArgs,
        /// Poll interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Serve the map over HTTP
    Serve {
        #[command(flatten)]
        paths: PathArgs,
        /// Address to listen on
        #[arg(long)]
        listen: Option<String>,
        /// Also run the snapshot watcher
        #[arg(long)]
        watch: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args, Debug)]
struct PathArgs {
    /// Snapshot file to read
    #[arg(short, long)]
    data: Option<PathBuf>,
    /// Directory for rendered maps
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

impl PathArgs {
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(data) = self.data {
            config.data_path = data;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default();

    match cli.command {
        Command::Render { paths, json, open } => {
            let service = MapService::new(paths.apply(config));
            if json {
                let map = service.build_map().await?;
                println!("{}", serde_json::to_string_pretty(&map)?);
                return Ok(());
            }

            let output = service.run_cycle().await?;
            println!("{}", output.artifact.display());
            if open {
                if let Err(e) = webbrowser::open(&output.artifact.to_string_lossy()) {
                    warn!("Could not open browser: {e}");
                }
            }
        }
        Command::Watch { paths, interval } => {
            let mut config = paths.apply(config);
            if let Some(secs) = interval {
                config.poll_interval_secs = secs;
            }
            let cancel_token = shutdown_token();
            watch::run(Arc::new(MapService::new(config)), cancel_token).await;
        }
        Command::Serve {
            paths,
            listen,
            watch,
        } => {
            let mut config = paths.apply(config);
            if let Some(listen) = listen {
                config.listen_address = listen;
            }
            let address = config.listen_address.clone();
            let service = Arc::new(MapService::new(config));
            let cancel_token = shutdown_token();

            let watcher = watch.then(|| {
                tokio::spawn(watch::run(Arc::clone(&service), cancel_token.clone()))
            });

            let served = server::serve(service, &address, cancel_token.clone()).await;
            cancel_token.cancel();
            if let Some(handle) = watcher {
                handle.await.context("watcher task panicked")?;
            }
            served?;
        }
        Command::Config { init } => {
            let path = AppConfig::get_config_path().context("failed to locate config file")?;
            if init {
                config.save().context("failed to write config file")?;
                info!("Wrote configuration to {}", path.display());
            }
            println!("Config file: {}", path.display());
            println!("{config:#?}");
        }
    }

    Ok(())
}

/// Token cancelled on Ctrl-C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutting down"),
            Err(e) => warn!("Failed to listen for Ctrl-C: {e}"),
        }
        signal_token.cancel();
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["meshmap", "render", "--data", "snap.json", "--json"]);
        match cli.command {
            Command::Render { paths, json, open } => {
                assert_eq!(paths.data, Some(PathBuf::from("snap.json")));
                assert!(json);
                assert!(!open);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::parse_from(["meshmap", "serve", "--listen", "0.0.0.0:8080", "--watch"]);
        assert!(matches!(
            cli.command,
            Command::Serve { listen: Some(ref l), watch: true, .. } if l == "0.0.0.0:8080"
        ));
    }

    #[test]
    fn test_render_rejects_json_with_open() {
        assert!(Cli::try_parse_from(["meshmap", "render", "--json", "--open"]).is_err());
    }

    #[test]
    fn test_path_args_override_config() {
        let paths = PathArgs {
            data: Some(PathBuf::from("/tmp/snap.json")),
            output_dir: None,
        };
        let base = AppConfig::default();
        let expected_dir = base.output_dir.clone();

        let config = paths.apply(base);
        assert_eq!(config.data_path, PathBuf::from("/tmp/snap.json"));
        assert_eq!(config.output_dir, expected_dir);
    }
}
