// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Module for the `run` CLI subcommand.

use super::ui;
use crate::pipeline::{self, PipelineSummary};
use crate::Config;
use clap::Parser;
use std::path::PathBuf;

/// Command line arguments for the `run` CLI command.
#[derive(Parser, Debug)]
pub struct Args {
    /// Playlist export to import.
    pub path: PathBuf,
    /// Do not ask for confirmation before downloading.
    #[arg(short, long)]
    pub yes: bool,
    /// Download overrides.
    #[command(flatten)]
    pub download: super::download::Args,
}

/// Import a playlist export, resolve links and download all tracks.
///
/// A failure to save the track store after resolving is logged, and the downloads still run for
/// the tracks that were already linked before.
///
/// # Errors
///
/// Returns an error if the playlist export or the track store cannot be read, or if the user
/// prompt fails.
#[allow(clippy::needless_pass_by_value)]
pub async fn run(config: &Config, args: Args) -> crate::Result<()> {
    let mut config = config.clone();
    args.download.apply(&mut config);

    let store = super::track_store(&config);
    let mut summary = PipelineSummary::default();

    let tracks = pipeline::read_playlist(&args.path)?;
    summary.added = pipeline::import(&store, tracks)?;

    let resolver = super::track_resolver(&config);
    match pipeline::resolve(&store, &resolver).await {
        Ok(resolve_summary) => {
            ui::print_resolve_summary(&resolve_summary);
            summary.add_resolve_summary(&resolve_summary);
        }
        Err(err) => log::error!("Failed to resolve tracks: {err}"),
    }

    if !args.yes && !ui::confirm_download(store.path())? {
        log::info!("Download cancelled.");
        ui::print_pipeline_summary(&summary);
        return Ok(());
    }

    let orchestrator = super::download_orchestrator(&config);
    let download_summary = pipeline::download(&store, &orchestrator).await?;
    ui::print_download_summary(&download_summary);
    summary.add_download_summary(&download_summary);

    ui::print_pipeline_summary(&summary);
    Ok(())
}
