// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Persistent, deduplicated storage of playlist tracks.
//!
//! Tracks are stored in a CSV file with the header
//! `Song Name,Artist,Album,Duration,Youtube Link`. Reading is lenient: unknown columns are
//! ignored and missing columns only degrade the affected rows.

use crate::track::{Track, TrackKey, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
use crate::util::{write_atomically, FormattedDuration};
use csv::StringRecord;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Column header for the track title.
const SONG_NAME_COLUMN: &str = "Song Name";
/// Column header for the track artist.
const ARTIST_COLUMN: &str = "Artist";
/// Column header for the album.
const ALBUM_COLUMN: &str = "Album";
/// Column header for the track duration.
const DURATION_COLUMN: &str = "Duration";
/// Column header for the remote source link.
const LINK_COLUMN: &str = "Youtube Link";

/// The header row of the track store, in order.
pub const HEADER: [&str; 5] = [
    SONG_NAME_COLUMN,
    ARTIST_COLUMN,
    ALBUM_COLUMN,
    DURATION_COLUMN,
    LINK_COLUMN,
];

/// A row of the track store could not be parsed. The row is dropped.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The row has no song name.
    #[error("row {line} has no song name")]
    MissingSongName {
        /// Line number of the row.
        line: u64,
    },
    /// The row is not valid CSV.
    #[error("malformed row: {0}")]
    Csv(#[from] csv::Error),
}

/// The track store could not be read or written.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// I/O Error.
    #[error("Failed to access track store {}: {source}", .path.display())]
    Io {
        /// Path of the track store.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not a readable CSV file.
    #[error("Failed to read track store {}: {source}", .path.display())]
    Csv {
        /// Path of the track store.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: csv::Error,
    },
}

/// Positions of the known columns in the CSV header.
#[derive(Debug, Default, Clone, Copy)]
struct ColumnIndices {
    /// Index of the song name column.
    song_name: Option<usize>,
    /// Index of the artist column.
    artist: Option<usize>,
    /// Index of the album column.
    album: Option<usize>,
    /// Index of the duration column.
    duration: Option<usize>,
    /// Index of the link column.
    link: Option<usize>,
}

impl ColumnIndices {
    /// Find the known columns in the given header row.
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|header| header.trim() == name);
        let indices = Self {
            song_name: find(SONG_NAME_COLUMN),
            artist: find(ARTIST_COLUMN),
            album: find(ALBUM_COLUMN),
            duration: find(DURATION_COLUMN),
            link: find(LINK_COLUMN),
        };
        for (name, index) in HEADER.iter().zip([
            indices.song_name,
            indices.artist,
            indices.album,
            indices.duration,
            indices.link,
        ]) {
            if index.is_none() {
                log::warn!("Track store has no column '{name}'");
            }
        }
        indices
    }

    /// Parse a single row into a track.
    fn parse_record(&self, record: &StringRecord) -> Result<Track, ParseError> {
        let field = |index: Option<usize>| {
            index
                .and_then(|index| record.get(index))
                .filter(|value| !value.is_empty())
        };

        let Some(song_name) = field(self.song_name) else {
            return Err(ParseError::MissingSongName {
                line: record.position().map_or(0, csv::Position::line),
            });
        };
        let artist = field(self.artist).unwrap_or(UNKNOWN_ARTIST);
        let album = field(self.album).unwrap_or(UNKNOWN_ALBUM);
        let duration = field(self.duration).unwrap_or_default();

        let track = Track::with_clock_duration(song_name, artist, album, duration);
        Ok(match field(self.link) {
            Some(link) => track.with_link(link),
            None => track,
        })
    }
}

/// Read all tracks from a CSV reader. Malformed rows are skipped.
fn read_tracks<R: Read>(reader: R) -> Result<Vec<Track>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnIndices::from_headers(reader.headers()?);

    let mut tracks = Vec::new();
    for result in reader.records() {
        let track = result
            .map_err(ParseError::from)
            .and_then(|record| columns.parse_record(&record));
        match track {
            Ok(track) => tracks.push(track),
            Err(err) => log::warn!("Skipping track: {err}"),
        }
    }
    Ok(tracks)
}

/// Persistent collection of tracks, backed by a CSV file.
#[derive(Debug, Clone)]
pub struct TrackStore {
    /// Path of the CSV file.
    path: PathBuf,
}

impl TrackStore {
    /// Create a track store backed by the file at the given path. The file does not need to
    /// exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all tracks.
    ///
    /// A missing file is treated as an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not a CSV file.
    pub fn try_load(&self) -> Result<Vec<Track>, PersistenceError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!(
                    "Track store {} does not exist yet, starting empty",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let tracks = read_tracks(BufReader::new(file)).map_err(|source| PersistenceError::Csv {
            path: self.path.clone(),
            source,
        })?;
        log::debug!(
            "Loaded {} tracks from {}",
            tracks.len(),
            self.path.display()
        );
        Ok(tracks)
    }

    /// Load all tracks, falling back to an empty list if the store cannot be read.
    #[must_use]
    pub fn load(&self) -> Vec<Track> {
        self.try_load()
            .inspect_err(|err| log::warn!("{err}"))
            .unwrap_or_default()
    }

    /// Replace the stored tracks with the given ones.
    ///
    /// The file is replaced atomically, so that readers never observe a partially written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, tracks: &[Track]) -> Result<(), PersistenceError> {
        write_atomically(&self.path, |writer| {
            let mut writer = csv::Writer::from_writer(writer);
            writer.write_record(HEADER)?;
            for track in tracks {
                let duration = if track.has_duration() {
                    track.duration.formatted_duration()
                } else {
                    track.duration_text().unwrap_or_default().to_string()
                };
                writer.write_record([
                    track.song_name.as_str(),
                    track.artist.as_str(),
                    track.album.as_str(),
                    duration.as_str(),
                    track.link().unwrap_or_default(),
                ])?;
            }
            writer.flush()
        })
        .map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("Saved {} tracks to {}", tracks.len(), self.path.display());
        Ok(())
    }
}

/// Merge new tracks into an existing list of tracks.
///
/// Tracks whose key is already present (either in `existing` or earlier in `new_tracks`) are
/// dropped. The order is preserved: existing tracks first, followed by the added tracks in the
/// order in which they arrived. Returns the merged list and the number of added tracks.
pub fn merge<I>(existing: Vec<Track>, new_tracks: I) -> (Vec<Track>, usize)
where
    I: IntoIterator<Item = Track>,
{
    let mut seen: HashSet<TrackKey> = HashSet::with_capacity(existing.len());
    let mut merged = Vec::with_capacity(existing.len());
    for track in existing {
        if seen.insert(track.key()) {
            merged.push(track);
        } else {
            log::warn!("Dropping duplicate stored track: {track}");
        }
    }

    let existing_count = merged.len();
    for track in new_tracks {
        if seen.insert(track.key()) {
            merged.push(track);
        } else {
            log::debug!("Skipping known track: {track}");
        }
    }

    let added_count = merged.len() - existing_count;
    (merged, added_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn track(song_name: &str, artist: &str) -> Track {
        Track::new(song_name, artist, "Album", TimeDelta::seconds(200))
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackStore::new(dir.path().join("playlist.csv"));
        assert!(store.try_load().unwrap().is_empty());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_unreadable_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackStore::new(dir.path());
        assert!(store.try_load().is_err());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        const LINK: &str = "https://www.youtube.com/watch?v=A_MjCqQoLLA";
        let dir = tempfile::tempdir().unwrap();
        let store = TrackStore::new(dir.path().join("playlist.csv"));
        let hey_jude = Track::new("Hey Jude", "The Beatles", "1", TimeDelta::seconds(431));
        let tracks = vec![
            hey_jude.with_link(LINK),
            Track::new("A, B", "Say \"Hi\"", "Album", TimeDelta::seconds(3826)),
            Track::new("Silence", UNKNOWN_ARTIST, UNKNOWN_ALBUM, TimeDelta::zero()),
        ];
        store.save(&tracks).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        let header = HEADER.join(",");
        let first_row = format!("Hey Jude,The Beatles,1,7:11,{LINK}");
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(header.as_str()));
        assert_eq!(lines.next(), Some(first_row.as_str()));
        assert_eq!(lines.next(), Some(r#""A, B","Say ""Hi""",Album,1:03:46,"#));
        assert_eq!(lines.next(), Some("Silence,Unknown Artist,Unknown Album,,"));

        assert_eq!(store.load(), tracks);
    }

    #[test]
    fn test_save_keeps_unparsable_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlist.csv");
        let header = HEADER.join(",");
        let content = format!("{header}\nB,Y,Al,Unknown Duration,\nC,Z,Al,,\n");
        std::fs::write(&path, content).unwrap();

        let store = TrackStore::new(&path);
        let tracks = store.load();
        assert_eq!(tracks[0].duration_text(), Some("Unknown Duration"));
        assert_eq!(tracks[1].duration_text(), None);
        store.save(&tracks).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("B,Y,Al,Unknown Duration,"));
        assert!(content.contains("C,Z,Al,,"));
        assert_eq!(store.load(), tracks);
    }

    #[test]
    fn test_load_tolerates_extra_and_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlist.csv");
        std::fs::write(
            &path,
            "Rating,Duration,Song Name,Artist\n5,3:46,First,Someone\n4,1:03:46,Second\n,,,Nobody\n",
        )
        .unwrap();

        let tracks = TrackStore::new(&path).load();
        let duration = TimeDelta::seconds(3826);
        let first = Track::new("First", "Someone", UNKNOWN_ALBUM, TimeDelta::seconds(226));
        let second = Track::new("Second", UNKNOWN_ARTIST, UNKNOWN_ALBUM, duration);
        assert_eq!(tracks, vec![first, second]);
    }

    #[test]
    fn test_load_skips_rows_with_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlist.csv");
        let mut content = b"Song Name,Artist,Album,Duration,Youtube Link\n".to_vec();
        content.extend_from_slice(b"Bad \xff,Artist,Album,3:00,\n");
        content.extend_from_slice(b"Good,Artist,Album,3:00,https://example.com/good\n");
        std::fs::write(&path, content).unwrap();

        let tracks = TrackStore::new(&path).load();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].song_name, "Good");
        assert_eq!(tracks[0].link(), Some("https://example.com/good"));
    }

    #[test]
    fn test_merge_preserves_order_and_drops_duplicates() {
        let existing = vec![track("A", "X"), track("B", "X")];
        let new_tracks = vec![
            track("C", "X"),
            track("A", "X").with_link("https://example.com/a"),
            track("D", "Y"),
            track("C", "X"),
            track("c", "X"),
        ];
        let (merged, added) = merge(existing, new_tracks);
        assert_eq!(added, 3);
        let names: Vec<&str> = merged.iter().map(|t| t.song_name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C", "D", "c"]);
        // The first occurrence wins, so the existing (unlinked) track is kept.
        assert!(!merged[0].is_resolved());
    }

    #[test]
    fn test_import_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackStore::new(dir.path().join("playlist.csv"));
        let imported = vec![track("A", "X"), track("B", "Y")];

        let (merged, added) = merge(store.load(), imported.clone());
        assert_eq!(added, 2);
        store.save(&merged).unwrap();

        let (merged, added) = merge(store.load(), imported);
        assert_eq!(added, 0);
        assert_eq!(merged.len(), 2);
    }
}
