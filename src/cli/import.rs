// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Module for the `import` CLI subcommand.

use super::ui;
use crate::pipeline::{self, PipelineSummary};
use crate::Config;
use clap::Parser;
use std::path::PathBuf;

/// Command line arguments for the `import` CLI command.
#[derive(Parser, Debug)]
pub struct Args {
    /// Playlist export to import.
    pub path: PathBuf,
}

/// Import the tracks of a playlist export into the track store.
///
/// # Errors
///
/// Returns an error if the playlist export or the track store cannot be read, or if the track
/// store cannot be written.
#[allow(clippy::needless_pass_by_value)]
pub fn run(config: &Config, args: Args) -> crate::Result<()> {
    let store = super::track_store(config);
    let tracks = pipeline::read_playlist(&args.path)?;
    let added = pipeline::import(&store, tracks)?;

    ui::print_pipeline_summary(&PipelineSummary {
        added,
        ..PipelineSummary::default()
    });
    Ok(())
}
