// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Fetching remote media into local, tagged MP3 files.

use crate::track::{Track, ARTIFACT_EXTENSION};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;

/// Infix of the temporary file names used while a download is in progress.
const PARTIAL_INFIX: &str = "tunefetch-partial";

/// Fetching a track failed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The download program could not be started.
    #[error("Failed to run {}: {source}", .program.display())]
    Spawn {
        /// The program that was invoked.
        program: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The download program exited with an error.
    #[error("Download exited with {status}: {stderr}")]
    CommandFailed {
        /// The exit status.
        status: ExitStatus,
        /// Error output of the program.
        stderr: String,
    },
    /// The download program succeeded, but did not produce the expected file.
    #[error("Expected output file {} is missing", .0.display())]
    MissingOutput(PathBuf),
    /// I/O Error.
    #[error("Input/Output error ({0})")]
    Io(#[from] io::Error),
    /// The fetch task panicked or was cancelled.
    #[error("Fetch task aborted: {0}")]
    Aborted(String),
}

/// Everything that is needed to fetch a single track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Locator of the remote media source.
    pub url: String,
    /// Directory that the artifact is written to.
    pub output_dir: PathBuf,
    /// File name of the artifact, without extension.
    pub filename_stem: String,
    /// Title tag.
    pub title: Option<String>,
    /// Artist tag.
    pub artist: Option<String>,
    /// Album tag.
    pub album: Option<String>,
}

impl FetchRequest {
    /// Build the request for a track. Returns `None` if the track has no link.
    #[must_use]
    pub fn for_track(track: &Track, output_dir: &Path) -> Option<Self> {
        let non_empty = |value: &str| Some(value.to_string()).filter(|value| !value.is_empty());
        let url = track.link()?.to_string();
        Some(Self {
            url,
            output_dir: output_dir.to_path_buf(),
            filename_stem: track.filename_stem(),
            title: non_empty(&track.song_name),
            artist: non_empty(&track.artist),
            album: non_empty(&track.album),
        })
    }

    /// The path at which the artifact is expected.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{ARTIFACT_EXTENSION}", self.filename_stem))
    }

    /// The metadata tags that should be embedded into the artifact.
    pub fn tags(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("title", self.title.as_deref()),
            ("artist", self.artist.as_deref()),
            ("album", self.album.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
    }
}

/// A service that downloads a remote media source into a local MP3 file.
///
/// Implementations must be safe to use concurrently for requests with distinct file names, and
/// must never leave a partially written file at [`FetchRequest::output_path`].
pub trait MediaFetcher {
    /// Fetch the media and write it to [`FetchRequest::output_path`].
    fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<(), FetchError>> + Send;
}

/// Media fetcher that runs `yt-dlp` (which in turn uses `ffmpeg` for transcoding).
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    /// Path or name of the `yt-dlp` executable.
    program: PathBuf,
    /// Audio quality passed to `--audio-quality` (e.g. `192K` or `0` for best VBR).
    audio_quality: String,
}

impl YtDlpFetcher {
    /// Create a new fetcher that invokes the given program.
    pub fn new(program: impl Into<PathBuf>, audio_quality: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            audio_quality: audio_quality.into(),
        }
    }
}

impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<(), FetchError> {
        tokio::fs::create_dir_all(&request.output_dir).await?;

        let partial_stem = format!(".{}.{PARTIAL_INFIX}", request.filename_stem);
        let partial_path = request
            .output_dir
            .join(format!("{partial_stem}.{ARTIFACT_EXTENSION}"));
        let output_template = format!(
            "{}.%(ext)s",
            escape_output_template(&request.output_dir.join(&partial_stem).to_string_lossy())
        );

        let mut command = Command::new(&self.program);
        let _ = command
            .arg("--format")
            .arg("bestaudio/best")
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg(ARTIFACT_EXTENSION)
            .arg("--audio-quality")
            .arg(&self.audio_quality)
            .arg("--no-playlist")
            .arg("--no-progress")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("--output")
            .arg(&output_template);
        let metadata_args = metadata_args(request);
        if !metadata_args.is_empty() {
            let _ = command
                .arg("--postprocessor-args")
                .arg(format!("ExtractAudio:{metadata_args}"));
        }
        let _ = command
            .arg("--")
            .arg(&request.url)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        log::debug!("Fetching {} to {}", request.url, partial_path.display());
        let output = command.output().await.map_err(|source| FetchError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            remove_partial_files(&request.output_dir, &partial_stem).await;
            return Err(FetchError::CommandFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(&partial_path).await.unwrap_or(false) {
            remove_partial_files(&request.output_dir, &partial_stem).await;
            return Err(FetchError::MissingOutput(partial_path));
        }

        // Only move the finished file into place, so that the output path never points to a
        // partial download.
        tokio::fs::rename(&partial_path, request.output_path()).await?;
        Ok(())
    }
}

/// Escape a literal string for use in a `yt-dlp` output template.
fn escape_output_template(value: &str) -> String {
    value.replace('%', "%%")
}

/// Quote a value so that it survives POSIX shell-style splitting.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

/// Build the `ffmpeg` arguments that embed the requested tags.
fn metadata_args(request: &FetchRequest) -> String {
    request
        .tags()
        .map(|(key, value)| format!("-metadata {}", shell_quote(&format!("{key}={value}"))))
        .collect::<Vec<String>>()
        .join(" ")
}

/// Remove leftovers of an unsuccessful download.
async fn remove_partial_files(output_dir: &Path, partial_stem: &str) {
    let mut entries = match tokio::fs::read_dir(output_dir).await {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!(
                "Failed to clean up partial downloads in {}: {err}",
                output_dir.display()
            );
            return;
        }
    };

    let prefix = format!("{partial_stem}.");
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_partial = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(&prefix));
        if !is_partial {
            continue;
        }

        let path = entry.path();
        if let Err(err) = tokio::fs::remove_file(&path).await {
            log::warn!(
                "Failed to remove partial download {}: {err}",
                path.display()
            );
        }
    }
}
