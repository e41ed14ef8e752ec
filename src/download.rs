// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The download orchestrator fetches all resolved tracks using a fixed number of parallel
//! workers.
//!
//! Jobs are distributed through a multi-consumer queue. Every worker owns its job from the
//! existence check to the final outcome, and sends that outcome to a single collector which
//! builds the [`DownloadSummary`].

use crate::fetch::{FetchError, FetchRequest, MediaFetcher};
use crate::track::Track;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default number of parallel downloads.
pub const DEFAULT_MAX_WORKERS: usize = 5;

/// Terminal state of a single download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// The artifact was downloaded.
    Succeeded,
    /// Nothing was downloaded (e.g. because the artifact already exists).
    Skipped,
    /// The download failed.
    Failed,
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "Finished"),
            Self::Skipped => write!(f, "Skipped"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// The outcome of downloading a single track.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Position of the track in the input.
    pub index: usize,
    /// The track.
    pub track: Track,
    /// The path of the artifact.
    pub path: PathBuf,
    /// The terminal state.
    pub status: DownloadStatus,
    /// Human-readable reason for skipped or failed downloads.
    pub reason: Option<String>,
}

/// Aggregated outcomes of a download run.
#[derive(Debug, Default, Clone)]
pub struct DownloadSummary {
    /// Number of downloaded tracks.
    pub succeeded: usize,
    /// Number of skipped tracks.
    pub skipped: usize,
    /// Number of failed tracks.
    pub failed: usize,
    /// All outcomes, in input order.
    pub outcomes: Vec<DownloadOutcome>,
}

impl DownloadSummary {
    /// Add an outcome to the summary.
    fn record(&mut self, outcome: DownloadOutcome) {
        match outcome.status {
            DownloadStatus::Succeeded => self.succeeded += 1,
            DownloadStatus::Skipped => self.skipped += 1,
            DownloadStatus::Failed => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Total number of recorded outcomes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// A single unit of work for a download worker.
#[derive(Debug)]
struct DownloadJob {
    /// Position of the track in the input.
    index: usize,
    /// The track.
    track: Track,
    /// The fetch request for the track.
    request: FetchRequest,
}

impl DownloadJob {
    /// Create an outcome for this job.
    fn into_outcome(self, status: DownloadStatus, reason: Option<String>) -> DownloadOutcome {
        DownloadOutcome {
            index: self.index,
            path: self.request.output_path(),
            track: self.track,
            status,
            reason,
        }
    }
}

/// Downloads resolved tracks in parallel.
#[derive(Debug)]
pub struct DownloadOrchestrator<F> {
    /// The fetcher, shared by all workers.
    fetcher: Arc<F>,
    /// Directory that the artifacts are written to.
    output_dir: PathBuf,
    /// Number of parallel workers (`0` means one per CPU).
    max_workers: usize,
}

impl<F> DownloadOrchestrator<F>
where
    F: MediaFetcher + Send + Sync + 'static,
{
    /// Create a new orchestrator that writes to the given directory.
    pub fn new(fetcher: F, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            output_dir: output_dir.into(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    /// Set the number of parallel downloads. Use `0` to run one worker per CPU.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// The directory that the artifacts are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The fetcher used by this orchestrator.
    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Number of workers to spawn for the given number of jobs.
    fn worker_count(&self, num_jobs: usize) -> usize {
        Some(self.max_workers)
            .filter(|&n| n != 0)
            .unwrap_or_else(num_cpus::get)
            .min(num_jobs)
            .max(1)
    }

    /// Download all resolved tracks that do not exist in the output directory yet.
    ///
    /// Tracks without a link are ignored. Individual failures are reported in the summary and do
    /// not affect other downloads.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory cannot be created.
    pub async fn run(&self, tracks: &[Track]) -> crate::Result<DownloadSummary> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let mut summary = DownloadSummary::default();
        let mut output_paths = HashSet::new();
        let mut jobs = Vec::new();
        for (index, track) in tracks.iter().enumerate() {
            let Some(request) = FetchRequest::for_track(track, &self.output_dir) else {
                log::debug!("Skipping '{}': No link", track.song_name);
                continue;
            };

            let job = DownloadJob {
                index,
                track: track.clone(),
                request,
            };
            if !output_paths.insert(job.request.output_path()) {
                log::warn!(
                    "Skipping '{}': Output file {} is already used by another track",
                    job.track.song_name,
                    job.request.output_path().display()
                );
                summary.record(job.into_outcome(
                    DownloadStatus::Skipped,
                    Some("duplicate output filename".to_string()),
                ));
                continue;
            }

            jobs.push(job);
        }

        let total = jobs.len();
        let num_workers = self.worker_count(total);
        log::info!("Starting batch download for {total} songs with {num_workers} workers...");

        let (job_tx, job_rx) = async_channel::bounded(num_workers * 2);
        let producer = tokio::task::spawn(async move {
            for job in jobs {
                if let Err(err) = job_tx.send(job).await {
                    log::error!("Workers dropped on sending job: {err}");
                    break;
                }
            }
        });

        let (result_tx, mut result_rx) = tokio::sync::mpsc::channel(20);
        let workers: Vec<_> = (0..num_workers)
            .map(|_| {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let fetcher = Arc::clone(&self.fetcher);
                tokio::task::spawn(async move {
                    while let Ok(job) = job_rx.recv().await {
                        let outcome = download(&fetcher, job).await;
                        if let Err(err) = result_tx.send(outcome).await {
                            log::error!("Collector dropped on sending outcome: {err}");
                        }
                    }
                })
            })
            .collect();
        drop(job_rx);
        drop(result_tx);

        let mut received: usize = 0;
        while let Some(outcome) = result_rx.recv().await {
            received += 1;
            log::debug!(
                "[{received}/{total}] {}: {}",
                outcome.status,
                outcome.track.song_name
            );
            summary.record(outcome);
        }

        for result in futures::future::join_all(workers).await {
            if let Err(err) = result {
                log::error!("Download worker failed: {err}");
            }
        }
        if let Err(err) = producer.await {
            log::error!("Download job producer failed: {err}");
        }

        summary.outcomes.sort_by_key(|outcome| outcome.index);
        log::info!(
            "Batch download complete: {} succeeded, {} skipped, {} failed",
            summary.succeeded,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }
}

/// Download a single track, unless its artifact already exists.
async fn download<F>(fetcher: &Arc<F>, job: DownloadJob) -> DownloadOutcome
where
    F: MediaFetcher + Send + Sync + 'static,
{
    let stem = job.request.filename_stem.clone();
    if tokio::fs::try_exists(job.request.output_path())
        .await
        .unwrap_or(false)
    {
        log::info!("Skipping: {stem} (Already exists)");
        return job.into_outcome(DownloadStatus::Skipped, Some("already exists".to_string()));
    }

    log::info!("Processing: {stem}...");
    let fetcher = Arc::clone(fetcher);
    let request = job.request.clone();
    let result = tokio::task::spawn(async move { fetcher.fetch(&request).await })
        .await
        .unwrap_or_else(|err| Err(FetchError::Aborted(err.to_string())));

    match result {
        Ok(()) => {
            log::info!("Finished: {stem}");
            job.into_outcome(DownloadStatus::Succeeded, None)
        }
        Err(err) => {
            log::error!(
                "Failed: {stem} ({} by {}, {}): {err}",
                job.track.song_name,
                job.track.artist,
                job.request.url
            );
            job.into_outcome(DownloadStatus::Failed, Some(err.to_string()))
        }
    }
}
