// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Command line interface.

mod config;
mod download;
mod import;
mod resolve;
mod run;
mod ui;

use crate::download::DownloadOrchestrator;
use crate::fetch::YtDlpFetcher;
use crate::resolver::TrackResolver;
use crate::search::YtDlpSearch;
use crate::store::TrackStore;
use crate::Config;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use std::path::PathBuf;

/// Command line Arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Show debug information.
    #[arg(short, long)]
    verbose: bool,
    /// Path to configuration file.
    #[arg(short, long, required = false)]
    config_path: Option<PathBuf>,
    /// Path to the track store (overrides the configured one).
    #[arg(short, long, required = false)]
    store: Option<PathBuf>,
    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Import tracks from a playlist export into the track store.
    Import(import::Args),
    /// Look up links for all tracks in the track store that have none yet.
    Resolve(resolve::Args),
    /// Download all resolved tracks.
    Download(download::Args),
    /// Import, resolve and download in one go.
    Run(run::Args),
    /// Print the effective configuration.
    Config(config::Args),
}

impl Args {
    /// Get the desired log level, depending on the verbose flag passed on the command line.
    fn log_level_filter(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    /// Get the current configuration.
    fn config(&self) -> crate::Result<Config> {
        let config_path = self.config_path.clone().or_else(|| {
            xdg::BaseDirectories::with_prefix("tunefetch").find_config_file("config.toml")
        });
        let mut config = match config_path {
            Some(path) => {
                log::debug!("Loading configuration from {}", path.display());
                Config::load_from_path(path)?.with_defaults()
            }
            None => Config::default(),
        };
        if let Some(store) = &self.store {
            config.paths.track_store = Some(store.clone());
        }

        Ok(config)
    }
}

/// Open the configured track store.
fn track_store(config: &Config) -> TrackStore {
    TrackStore::new(config.paths.track_store())
}

/// Create a resolver that searches with the configured `yt-dlp` executable.
fn track_resolver(config: &Config) -> TrackResolver<YtDlpSearch> {
    TrackResolver::new(YtDlpSearch::new(config.search.program()))
        .with_result_limit(config.search.result_limit())
}

/// Create an orchestrator that downloads with the configured `yt-dlp` executable.
fn download_orchestrator(config: &Config) -> DownloadOrchestrator<YtDlpFetcher> {
    let fetcher = YtDlpFetcher::new(config.download.program(), config.download.audio_quality());
    DownloadOrchestrator::new(fetcher, config.paths.output_dir())
        .with_max_workers(config.download.max_workers())
}

/// Main entry point.
///
/// # Errors
///
/// Can returns errors if the command line arguments are incorrect or the executed programs lead to
/// an error.
pub async fn main() -> crate::Result<()> {
    let args = Args::parse();
    TermLogger::init(
        args.log_level_filter(),
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;
    let config = args.config()?;

    match args.command {
        Command::Import(cmd_args) => import::run(&config, cmd_args),
        Command::Resolve(cmd_args) => resolve::run(&config, cmd_args).await,
        Command::Download(cmd_args) => download::run(&config, cmd_args).await,
        Command::Run(cmd_args) => run::run(&config, cmd_args).await,
        Command::Config(cmd_args) => config::run(&config, cmd_args),
    }
}
