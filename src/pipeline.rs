// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The stages of the pipeline: import, resolve and download.
//!
//! Every stage loads the track store, runs its component and (if anything changed) saves the
//! store again. Re-running a stage is a no-op for tracks that were already processed.

use crate::download::{DownloadOrchestrator, DownloadSummary};
use crate::fetch::MediaFetcher;
use crate::resolver::{ResolveSummary, TrackResolver};
use crate::search::SearchProvider;
use crate::store::{self, TrackStore};
use crate::track::Track;
use std::fmt;
use std::io;
use std::path::Path;

/// Overall counts of a pipeline run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Number of newly imported tracks.
    pub added: usize,
    /// Number of tracks that were assigned a link.
    pub resolved: usize,
    /// Number of downloaded tracks.
    pub downloaded: usize,
    /// Number of tracks that were skipped.
    pub skipped: usize,
    /// Number of tracks that could not be resolved or downloaded.
    pub failed: usize,
}

impl PipelineSummary {
    /// Add the counts of a resolution run.
    pub fn add_resolve_summary(&mut self, summary: &ResolveSummary) {
        self.resolved += summary.resolved;
        self.skipped += summary.skipped;
        self.failed += summary.unresolved;
    }

    /// Add the counts of a download run.
    pub fn add_download_summary(&mut self, summary: &DownloadSummary) {
        self.downloaded += summary.succeeded;
        self.skipped += summary.skipped;
        self.failed += summary.failed;
    }
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} resolved, {} downloaded, {} skipped, {} failed",
            self.added, self.resolved, self.downloaded, self.skipped, self.failed
        )
    }
}

/// Read the tracks of a playlist export in the track store format.
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be read.
pub fn read_playlist(path: &Path) -> crate::Result<Vec<Track>> {
    if !path.is_file() {
        let message = format!("Playlist export {} does not exist", path.display());
        return Err(io::Error::new(io::ErrorKind::NotFound, message).into());
    }

    let tracks = TrackStore::new(path).try_load()?;
    log::info!("Read {} tracks from {}", tracks.len(), path.display());
    Ok(tracks)
}

/// Merge new tracks into the store and return the number of added tracks.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub fn import(store: &TrackStore, tracks: Vec<Track>) -> crate::Result<usize> {
    let existing = store.try_load()?;
    let (merged, added) = store::merge(existing, tracks);
    if added == 0 {
        log::info!("No new songs found.");
        return Ok(0);
    }

    store.save(&merged)?;
    log::info!(
        "Successfully added {added} new songs to '{}'.",
        store.path().display()
    );
    Ok(added)
}

/// Assign links to all unresolved tracks in the store.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written. Failures to resolve individual tracks
/// are not errors.
pub async fn resolve<S: SearchProvider>(
    store: &TrackStore,
    resolver: &TrackResolver<S>,
) -> crate::Result<ResolveSummary> {
    let mut tracks = store.try_load()?;
    log::info!("Processing {} songs...", tracks.len());
    let summary = resolver.resolve_all(&mut tracks).await;
    if summary.resolved > 0 {
        store.save(&tracks)?;
        log::info!("Successfully updated '{}'.", store.path().display());
    }

    Ok(summary)
}

/// Download all resolved tracks in the store that have not been downloaded yet.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the output directory cannot be created.
/// Failures to download individual tracks are not errors.
pub async fn download<F>(
    store: &TrackStore,
    orchestrator: &DownloadOrchestrator<F>,
) -> crate::Result<DownloadSummary>
where
    F: MediaFetcher + Send + Sync + 'static,
{
    let tracks = store.try_load()?;
    orchestrator.run(&tracks).await
}
