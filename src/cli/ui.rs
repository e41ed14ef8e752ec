// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! User Interface (UI) utilities.

use crate::download::{DownloadStatus, DownloadSummary};
use crate::pipeline::PipelineSummary;
use crate::resolver::ResolveSummary;
use crossterm::style::{Color, StyledContent, Stylize};
use inquire::Confirm;
use std::path::Path;

/// Style a counter in the given color, or grey it out if it is zero.
fn count(value: usize, color: Color) -> StyledContent<String> {
    if value == 0 {
        value.to_string().grey()
    } else {
        value.to_string().with(color).bold()
    }
}

/// Print the result of a resolution run.
pub fn print_resolve_summary(summary: &ResolveSummary) {
    println!(
        "Resolved: {resolved}, already linked: {linked}, skipped: {skipped}, unresolved: {unresolved}",
        resolved = count(summary.resolved, Color::Green),
        linked = count(summary.already_linked, Color::Blue),
        skipped = count(summary.skipped, Color::Yellow),
        unresolved = count(summary.unresolved, Color::Red),
    );
}

/// Print the result of a download run, including the reason for every failed track.
pub fn print_download_summary(summary: &DownloadSummary) {
    for outcome in summary
        .outcomes
        .iter()
        .filter(|outcome| outcome.status == DownloadStatus::Failed)
    {
        println!(
            "{status} {track} {reason}",
            status = "Failed:".red().bold(),
            track = outcome.track,
            reason = outcome.reason.as_deref().unwrap_or_default().grey(),
        );
    }

    println!(
        "Downloaded: {succeeded}, skipped: {skipped}, failed: {failed} (of {total} tracks)",
        succeeded = count(summary.succeeded, Color::Green),
        skipped = count(summary.skipped, Color::Yellow),
        failed = count(summary.failed, Color::Red),
        total = summary.total(),
    );
}

/// Print the overall result of a pipeline run.
pub fn print_pipeline_summary(summary: &PipelineSummary) {
    println!(
        "{title} {added} added, {resolved} resolved, {downloaded} downloaded, {skipped} skipped, {failed} failed",
        title = "Summary:".bold(),
        added = count(summary.added, Color::Blue),
        resolved = count(summary.resolved, Color::Green),
        downloaded = count(summary.downloaded, Color::Green),
        skipped = count(summary.skipped, Color::Yellow),
        failed = count(summary.failed, Color::Red),
    );
}

/// Ask the user to check the track store before starting the downloads.
///
/// Returns `false` if the user declined.
pub fn confirm_download(store_path: &Path) -> crate::Result<bool> {
    let confirmed = Confirm::new(&format!(
        "Please verify the links in '{}'. Start downloading?",
        store_path.display()
    ))
    .with_default(true)
    .prompt()?;
    Ok(confirmed)
}
