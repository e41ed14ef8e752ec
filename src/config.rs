// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Configuration utils.

use crate::download::DEFAULT_MAX_WORKERS;
use crate::resolver::DEFAULT_RESULT_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Encountered when the configuration cannot be loaded.
#[derive(Error, Debug)]
#[error("Configuration Error: {0}")]
pub struct ConfigError(#[from] toml::de::Error);

/// Default configuration TOML string.
const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Fallback name of the `yt-dlp` executable.
const DEFAULT_PROGRAM: &str = "yt-dlp";

/// Represents a piece of configuration that can be merged with another one.
trait MergeableConfig {
    /// Merge this configuration object with another one, taking values not set in this object from
    /// the other one (if present).
    fn merge(&self, other: &Self) -> Self;
}

/// File system locations.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct PathConfig {
    /// The CSV file that holds the tracks.
    pub track_store: Option<PathBuf>,
    /// Directory that downloaded files are written to.
    pub output_dir: Option<PathBuf>,
}

impl MergeableConfig for PathConfig {
    fn merge(&self, other: &Self) -> Self {
        PathConfig {
            track_store: self
                .track_store
                .clone()
                .or_else(|| other.track_store.clone()),
            output_dir: self.output_dir.clone().or_else(|| other.output_dir.clone()),
        }
    }
}

impl PathConfig {
    /// The CSV file that holds the tracks.
    #[must_use]
    pub fn track_store(&self) -> &Path {
        self.track_store
            .as_deref()
            .unwrap_or_else(|| Path::new("playlist.csv"))
    }

    /// Directory that downloaded files are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.output_dir
            .as_deref()
            .unwrap_or_else(|| Path::new("downloads"))
    }
}

/// Configuration for searching media sources.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// The `yt-dlp` executable.
    pub program: Option<PathBuf>,
    /// Number of search results that are considered per track.
    pub result_limit: Option<usize>,
}

impl MergeableConfig for SearchConfig {
    fn merge(&self, other: &Self) -> Self {
        SearchConfig {
            program: self.program.clone().or_else(|| other.program.clone()),
            result_limit: self.result_limit.or(other.result_limit).filter(|&x| x != 0),
        }
    }
}

impl SearchConfig {
    /// The `yt-dlp` executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        self.program
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PROGRAM))
    }

    /// Number of search results that are considered per track.
    #[must_use]
    pub fn result_limit(&self) -> usize {
        self.result_limit.unwrap_or(DEFAULT_RESULT_LIMIT)
    }
}

/// Configuration for downloading tracks.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// The `yt-dlp` executable.
    pub program: Option<PathBuf>,
    /// Number of parallel downloads.
    ///
    /// Use `0` to run one download per CPU.
    pub max_workers: Option<usize>,
    /// Audio quality of the transcoded MP3 files (e.g. `192K`, or `0` for the best VBR quality).
    pub audio_quality: Option<String>,
}

impl MergeableConfig for DownloadConfig {
    fn merge(&self, other: &Self) -> Self {
        DownloadConfig {
            program: self.program.clone().or_else(|| other.program.clone()),
            max_workers: self.max_workers.or(other.max_workers),
            audio_quality: self
                .audio_quality
                .clone()
                .or_else(|| other.audio_quality.clone()),
        }
    }
}

impl DownloadConfig {
    /// The `yt-dlp` executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        self.program
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PROGRAM))
    }

    /// Number of parallel downloads (`0` means one per CPU).
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers.unwrap_or(DEFAULT_MAX_WORKERS)
    }

    /// Audio quality of the transcoded MP3 files.
    #[must_use]
    pub fn audio_quality(&self) -> &str {
        self.audio_quality.as_deref().unwrap_or("192K")
    }
}

/// The main configuration struct.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// File system locations.
    #[serde(default)]
    pub paths: PathConfig,
    /// Configuration for searching media sources.
    #[serde(default)]
    pub search: SearchConfig,
    /// Configuration for downloading tracks.
    #[serde(default)]
    pub download: DownloadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::load_default().unwrap_or_else(|err| {
            log::error!("Failed to load default config: {err}");
            Self {
                paths: PathConfig::default(),
                search: SearchConfig::default(),
                download: DownloadConfig::default(),
            }
        })
    }
}

impl MergeableConfig for Config {
    /// Merge this configuration object with another one, taking values not set in this object from
    /// the other one (if present).
    fn merge(&self, other: &Self) -> Self {
        Config {
            paths: self.paths.merge(&other.paths),
            search: self.search.merge(&other.search),
            download: self.download.merge(&other.download),
        }
    }
}

impl Config {
    /// Load the configuration from a string slice.
    fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str(text)?;
        Ok(config)
    }

    /// Load the default configuration.
    fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_str(DEFAULT_CONFIG)
    }

    /// Load the configuration from a file located at the given path.
    ///
    /// # Errors
    ///
    /// This method can fail if the file cannot be accessed or if it contains malformed
    /// configuration markup.
    pub fn load_from_path<T: AsRef<Path>>(path: T) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::load_from_str(&text)?;
        Ok(config)
    }

    /// Merge this configuration struct with the default values.
    #[must_use]
    pub fn with_defaults(&self) -> Self {
        let default = Self::default();
        self.merge(&default)
    }
}
