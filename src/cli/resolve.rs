// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Module for the `resolve` CLI subcommand.

use super::ui;
use crate::pipeline;
use crate::Config;
use clap::Parser;

/// Command line arguments for the `resolve` CLI command.
#[derive(Parser, Debug)]
pub struct Args {
    /// Number of search results to consider per track (overrides the configured one).
    #[arg(short = 'n', long)]
    pub result_limit: Option<usize>,
}

/// Look up links for all unresolved tracks in the track store.
///
/// # Errors
///
/// Returns an error if the track store cannot be read or written.
#[allow(clippy::needless_pass_by_value)]
pub async fn run(config: &Config, args: Args) -> crate::Result<()> {
    let store = super::track_store(config);
    let mut resolver = super::track_resolver(config);
    if let Some(result_limit) = args.result_limit {
        resolver = resolver.with_result_limit(result_limit);
    }

    let summary = pipeline::resolve(&store, &resolver).await?;
    ui::print_resolve_summary(&summary);
    Ok(())
}
