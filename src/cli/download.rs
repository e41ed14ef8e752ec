// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Module for the `download` CLI subcommand.

use super::ui;
use crate::pipeline;
use crate::Config;
use clap::Parser;
use std::path::PathBuf;

/// Command line arguments for the `download` CLI command.
#[derive(Parser, Debug)]
pub struct Args {
    /// Directory to write the MP3 files to (overrides the configured one).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Number of parallel downloads (overrides the configured one, `0` means one per CPU).
    #[arg(short = 'j', long)]
    pub max_workers: Option<usize>,
}

impl Args {
    /// Apply the overrides from the command line to the configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(output_dir) = &self.output_dir {
            config.paths.output_dir = Some(output_dir.clone());
        }
        if let Some(max_workers) = self.max_workers {
            config.download.max_workers = Some(max_workers);
        }
    }
}

/// Download all resolved tracks in the track store.
///
/// # Errors
///
/// Returns an error if the track store cannot be read or the output directory cannot be created.
#[allow(clippy::needless_pass_by_value)]
pub async fn run(config: &Config, args: Args) -> crate::Result<()> {
    let mut config = config.clone();
    args.apply(&mut config);

    let store = super::track_store(&config);
    let orchestrator = super::download_orchestrator(&config);
    let summary = pipeline::download(&store, &orchestrator).await?;
    ui::print_download_summary(&summary);
    Ok(())
}
