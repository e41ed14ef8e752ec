// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Playlist tracks.

use crate::util::{parse_duration, sanitize_filename, DurationParseError, FormattedDuration};
use chrono::TimeDelta;
use std::fmt;

/// Placeholder used by playlist exports when the artist is not known.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Placeholder used by playlist exports when the album is not known.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// File extension of the downloaded artifacts.
pub const ARTIFACT_EXTENSION: &str = "mp3";

/// A single track from a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// The track's title.
    pub song_name: String,
    /// The track's artist.
    pub artist: String,
    /// The album the track appears on.
    pub album: String,
    /// The nominal length of the track. Zero if unknown.
    pub duration: TimeDelta,
    /// Locator of the remote media source, if already resolved.
    pub link: Option<String>,
    /// The duration as given in the playlist, if it could not be parsed.
    duration_text: Option<String>,
}

/// The key that identifies a track, consisting of its title and artist.
///
/// Comparison is case-sensitive and exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackKey {
    /// The track's title.
    song_name: String,
    /// The track's artist.
    artist: String,
}

impl Track {
    /// Create a new, unresolved track.
    pub fn new(
        song_name: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration: TimeDelta,
    ) -> Self {
        Self {
            song_name: song_name.into(),
            artist: artist.into(),
            album: album.into(),
            duration,
            link: None,
            duration_text: None,
        }
    }

    /// Create a new, unresolved track whose duration is given as clock string (`M:SS` or
    /// `H:MM:SS`).
    ///
    /// If the duration cannot be parsed, it is set to zero and the track cannot be resolved. The
    /// unparsable text is kept, see [`Track::duration_text`].
    pub fn with_clock_duration(
        song_name: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration: &str,
    ) -> Self {
        let mut track = Self::new(song_name, artist, album, TimeDelta::zero());
        match parse_duration(duration) {
            Ok(parsed) => track.duration = parsed,
            Err(DurationParseError::Empty) => {}
            Err(err) => {
                log::debug!("Track '{}' has no usable duration: {err}", track.song_name);
                track.duration_text = Some(duration.trim().to_string());
            }
        }
        track
    }

    /// The duration text from the playlist, if it could not be parsed into a duration.
    #[must_use]
    pub fn duration_text(&self) -> Option<&str> {
        self.duration_text.as_deref()
    }

    /// Assign a link to this track.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// The identity key of this track.
    #[must_use]
    pub fn key(&self) -> TrackKey {
        TrackKey {
            song_name: self.song_name.clone(),
            artist: self.artist.clone(),
        }
    }

    /// Returns the link if it is set and non-empty.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref().filter(|link| !link.is_empty())
    }

    /// Returns `true` if this track has been assigned a remote source.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.link().is_some()
    }

    /// Returns `true` if the track has a known duration that candidates can be matched against.
    #[must_use]
    pub fn has_duration(&self) -> bool {
        self.duration > TimeDelta::zero()
    }

    /// Returns the artist, unless it is empty or the "unknown" placeholder.
    #[must_use]
    pub fn known_artist(&self) -> Option<&str> {
        Some(self.artist.as_str()).filter(|artist| !artist.is_empty() && *artist != UNKNOWN_ARTIST)
    }

    /// Build the free-text query that is used to search for this track.
    #[must_use]
    pub fn search_query(&self) -> String {
        match self.known_artist() {
            Some(artist) => format!("{} {artist} audio", self.song_name),
            None => format!("{} audio", self.song_name),
        }
    }

    /// The file name (without extension) of the downloaded artifact.
    #[must_use]
    pub fn filename_stem(&self) -> String {
        let song_name = Some(self.song_name.as_str())
            .filter(|value| !value.is_empty())
            .unwrap_or("Unknown");
        let artist = Some(self.artist.as_str())
            .filter(|value| !value.is_empty())
            .unwrap_or("Unknown");
        format!(
            "{} - {}",
            sanitize_filename(song_name),
            sanitize_filename(artist)
        )
    }

    /// The file name (with extension) of the downloaded artifact.
    #[must_use]
    pub fn artifact_filename(&self) -> String {
        format!("{}.{ARTIFACT_EXTENSION}", self.filename_stem())
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.song_name)?;
        if self.has_duration() {
            write!(f, " ({})", self.duration.formatted_duration())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_clock_duration() {
        let track = Track::with_clock_duration("Song", "Artist", "Album", "3:46");
        assert_eq!(track.duration, TimeDelta::seconds(226));
        assert!(track.has_duration());

        let track = Track::with_clock_duration("Song", "Artist", "Album", "Unknown Duration");
        assert_eq!(track.duration, TimeDelta::zero());
        assert!(!track.has_duration());
        assert_eq!(track.duration_text(), Some("Unknown Duration"));

        let track = Track::with_clock_duration("Song", "Artist", "Album", "");
        assert!(!track.has_duration());
        assert_eq!(track.duration_text(), None);
    }

    #[test]
    fn test_key_is_case_sensitive() {
        let lower = Track::new("song", "artist", "", TimeDelta::zero());
        let upper = Track::new("Song", "artist", "", TimeDelta::zero());
        let other_album = Track::new("song", "artist", "Album", TimeDelta::seconds(10));
        assert_ne!(lower.key(), upper.key());
        assert_eq!(lower.key(), other_album.key());
    }

    #[test]
    fn test_empty_link_is_unresolved() {
        let track = Track::new("Song", "Artist", "Album", TimeDelta::seconds(1)).with_link("");
        assert!(!track.is_resolved());
        assert_eq!(track.link(), None);

        let track = track.with_link("https://www.youtube.com/watch?v=abc");
        assert!(track.is_resolved());
    }

    #[test]
    fn test_search_query() {
        let track = Track::new("Hey Jude", "The Beatles", "1", TimeDelta::seconds(431));
        assert_eq!(track.search_query(), "Hey Jude The Beatles audio");

        let track = Track::new("Hey Jude", UNKNOWN_ARTIST, "1", TimeDelta::seconds(431));
        assert_eq!(track.search_query(), "Hey Jude audio");

        let track = Track::new("Hey Jude", "", "1", TimeDelta::seconds(431));
        assert_eq!(track.search_query(), "Hey Jude audio");
    }

    #[test]
    fn test_artifact_filename() {
        let track = Track::new("What's Up?", "4 Non Blondes", "", TimeDelta::zero());
        assert_eq!(track.filename_stem(), "What's Up - 4 Non Blondes");
        assert_eq!(track.artifact_filename(), "What's Up - 4 Non Blondes.mp3");

        let track = Track::new("AC/DC: Live", "", "", TimeDelta::zero());
        assert_eq!(track.filename_stem(), "ACDC Live - Unknown");
    }

    #[test]
    fn test_display() {
        let track = Track::new("Song", "Artist", "Album", TimeDelta::seconds(3826));
        assert_eq!(track.to_string(), "Artist - Song (1:03:46)");
    }
}
