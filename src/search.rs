// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Searching for remote media sources.

use crate::util::duration_from_secs_f64;
use chrono::TimeDelta;
use serde::Deserialize;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Fully qualified locator of the media source.
    pub url: String,
    /// Length of the media, if known.
    pub duration: Option<TimeDelta>,
    /// Whether the result is a live stream.
    pub is_live: bool,
}

/// Searching failed.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The search program could not be started.
    #[error("Failed to run {}: {source}", .program.display())]
    Spawn {
        /// The program that was invoked.
        program: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The search program exited with an error.
    #[error("Search exited with {status}: {stderr}")]
    CommandFailed {
        /// The exit status.
        status: ExitStatus,
        /// Error output of the program.
        stderr: String,
    },
}

/// A service that can be searched for media sources using a free-text query.
pub trait SearchProvider {
    /// Search for the given query and return at most `limit` results, in order of relevance.
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SearchResult>, SearchError>> + Send;
}

/// Search provider that runs `yt-dlp` to search YouTube.
#[derive(Debug, Clone)]
pub struct YtDlpSearch {
    /// Path or name of the `yt-dlp` executable.
    program: PathBuf,
}

impl YtDlpSearch {
    /// Create a new search provider that invokes the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SearchProvider for YtDlpSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        log::debug!("Searching for {query:?} (limit: {limit})");
        let output = Command::new(&self.program)
            .arg("--dump-json")
            .arg("--flat-playlist")
            .arg("--no-warnings")
            .arg("--match-filter")
            .arg("!is_live")
            .arg(format!("ytsearch{limit}:{query}"))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| SearchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SearchError::CommandFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let results = parse_search_output(&String::from_utf8_lossy(&output.stdout));
        log::debug!("Found {} results for query {query:?}", results.len());
        Ok(results)
    }
}

/// A single entry as printed by `yt-dlp --dump-json --flat-playlist`.
#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    /// Video ID.
    id: Option<String>,
    /// Video URL (sometimes only the ID).
    url: Option<String>,
    /// Duration in seconds.
    duration: Option<f64>,
    /// Whether this is a live stream.
    is_live: Option<bool>,
    /// Live status (e.g. `is_live`, `was_live`, `not_live`).
    live_status: Option<String>,
}

impl YtDlpEntry {
    /// Returns a fully qualified URL for this entry.
    fn full_url(&self) -> Option<String> {
        self.url
            .as_deref()
            .filter(|url| url.contains("youtube.com") || url.contains("youtu.be"))
            .map(ToString::to_string)
            .or_else(|| {
                self.id
                    .as_deref()
                    .map(|id| format!("https://www.youtube.com/watch?v={id}"))
            })
    }

    /// Convert this entry into a search result.
    fn into_search_result(self) -> Option<SearchResult> {
        let url = self.full_url()?;
        let live_status = self.live_status.as_deref();
        let is_live = self.is_live.unwrap_or(false) || live_status == Some("is_live");
        Some(SearchResult {
            url,
            duration: self.duration.and_then(duration_from_secs_f64),
            is_live,
        })
    }
}

/// Parse the line-delimited JSON output of `yt-dlp`. Lines that cannot be parsed are ignored.
fn parse_search_output(output: &str) -> Vec<SearchResult> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            serde_json::from_str::<YtDlpEntry>(line)
                .inspect_err(|err| log::debug!("Ignoring malformed search output line: {err}"))
                .ok()
        })
        .filter_map(YtDlpEntry::into_search_result)
        .collect()
}
