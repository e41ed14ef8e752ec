// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Resolution of tracks to remote media sources.
//!
//! For every track without a link, the search provider is queried for a handful of candidates.
//! The candidate whose length is closest to the track's nominal duration wins.

use crate::search::{SearchError, SearchProvider, SearchResult};
use crate::track::Track;
use crate::util::FormattedDuration;
use chrono::TimeDelta;
use std::fmt;
use thiserror::Error;

/// Default number of search results that are considered per track.
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// A potential media source for a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Locator of the media source.
    link: String,
    /// Length of the media.
    duration: TimeDelta,
}

impl Candidate {
    /// Create a new candidate.
    pub fn new(link: impl Into<String>, duration: TimeDelta) -> Self {
        Self {
            link: link.into(),
            duration,
        }
    }

    /// Create a candidate from a search result. Returns `None` if the duration of the result is
    /// unknown.
    fn from_search_result(result: SearchResult) -> Option<Self> {
        let duration = result.duration?;
        Some(Self::new(result.url, duration))
    }

    /// The locator of the media source.
    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    /// The absolute difference between the candidate's length and the given target length.
    #[must_use]
    pub fn distance_to(&self, target: TimeDelta) -> TimeDelta {
        (self.duration - target).abs()
    }
}

/// Select the candidate whose length is closest to the target length.
///
/// If several candidates are equally close, the first one wins.
pub fn select_best_candidate<I>(target: TimeDelta, candidates: I) -> Option<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    candidates
        .into_iter()
        .inspect(|candidate| {
            log::debug!(
                "Candidate {} differs by {}s",
                candidate.link,
                candidate.distance_to(target).num_seconds()
            );
        })
        .min_by_key(|candidate| candidate.distance_to(target))
}

/// Reason why a track was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The track already has a link.
    AlreadyLinked,
    /// The track has no usable duration to match against.
    InvalidDuration,
    /// The track has no title to search for.
    MissingTitle,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyLinked => write!(f, "already has link"),
            Self::InvalidDuration => write!(f, "invalid duration"),
            Self::MissingTitle => write!(f, "missing title"),
        }
    }
}

/// A track could not be resolved. The track stays unresolved and is retried on the next run.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// None of the search results was suitable.
    #[error("No suitable match found")]
    NoMatch,
    /// Searching failed.
    #[error("Search failed: {0}")]
    Search(#[from] SearchError),
}

/// The result of resolving a single track.
#[derive(Debug)]
pub enum ResolveOutcome {
    /// A link was assigned to the track.
    Resolved(String),
    /// The track was not processed.
    Skipped(SkipReason),
    /// No link could be found for the track.
    Unresolved(ResolutionError),
}

/// Counts of the outcomes of a resolution run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Number of tracks that were assigned a link.
    pub resolved: usize,
    /// Number of tracks that already had a link.
    pub already_linked: usize,
    /// Number of tracks that cannot be resolved.
    pub skipped: usize,
    /// Number of tracks for which no link was found.
    pub unresolved: usize,
}

impl ResolveSummary {
    /// Count the given outcome.
    fn record(&mut self, outcome: &ResolveOutcome) {
        match outcome {
            ResolveOutcome::Resolved(_) => self.resolved += 1,
            ResolveOutcome::Skipped(SkipReason::AlreadyLinked) => self.already_linked += 1,
            ResolveOutcome::Skipped(_) => self.skipped += 1,
            ResolveOutcome::Unresolved(_) => self.unresolved += 1,
        }
    }
}

/// Assigns links to tracks using a search provider.
#[derive(Debug)]
pub struct TrackResolver<S> {
    /// The search provider.
    search: S,
    /// Maximum number of search results to consider per track.
    result_limit: usize,
}

impl<S: SearchProvider> TrackResolver<S> {
    /// Create a new resolver.
    pub fn new(search: S) -> Self {
        Self {
            search,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }

    /// Set the maximum number of search results to consider per track.
    #[must_use]
    pub fn with_result_limit(mut self, result_limit: usize) -> Self {
        self.result_limit = result_limit.max(1);
        self
    }

    /// Find the best matching link for the given track.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails or none of the results has a known length.
    pub async fn find_link(&self, track: &Track) -> Result<String, ResolutionError> {
        let query = track.search_query();
        let results = self.search.search(&query, self.result_limit).await?;
        let candidates = results
            .into_iter()
            .filter(|result| !result.is_live)
            .filter_map(Candidate::from_search_result);

        select_best_candidate(track.duration, candidates)
            .map(|candidate| candidate.link)
            .ok_or(ResolutionError::NoMatch)
    }

    /// Resolve a single track and assign the link to it.
    ///
    /// Tracks that already have a link are never modified.
    pub async fn resolve_track(&self, track: &mut Track) -> ResolveOutcome {
        if track.is_resolved() {
            return ResolveOutcome::Skipped(SkipReason::AlreadyLinked);
        }

        if track.song_name.is_empty() {
            return ResolveOutcome::Skipped(SkipReason::MissingTitle);
        }

        if !track.has_duration() {
            return ResolveOutcome::Skipped(SkipReason::InvalidDuration);
        }

        match self.find_link(track).await {
            Ok(link) => {
                track.link = Some(link.clone());
                ResolveOutcome::Resolved(link)
            }
            Err(err) => ResolveOutcome::Unresolved(err),
        }
    }

    /// Resolve all tracks in order.
    ///
    /// Failures are logged and do not stop the processing of subsequent tracks.
    pub async fn resolve_all(&self, tracks: &mut [Track]) -> ResolveSummary {
        let total = tracks.len();
        let mut summary = ResolveSummary::default();
        for (index, track) in tracks.iter_mut().enumerate() {
            let position = index + 1;
            if track.has_duration() && !track.is_resolved() && !track.song_name.is_empty() {
                log::info!(
                    "[{position}/{total}] Searching for '{}' ({})",
                    track.song_name,
                    track.duration.formatted_duration()
                );
            }

            let outcome = self.resolve_track(track).await;
            match &outcome {
                ResolveOutcome::Resolved(link) => log::info!("  -> Found: {link}"),
                ResolveOutcome::Skipped(reason) => {
                    log::info!(
                        "[{position}/{total}] Skipping '{}' ({reason})",
                        track.song_name
                    );
                }
                ResolveOutcome::Unresolved(ResolutionError::NoMatch) => {
                    log::info!("  -> No suitable match found");
                }
                ResolveOutcome::Unresolved(err) => {
                    log::error!("  -> Failed to resolve '{}': {err}", track.song_name);
                }
            }
            summary.record(&outcome);
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::FakeSearch;

    fn result(url: &str, seconds: Option<i64>) -> SearchResult {
        SearchResult {
            url: url.to_string(),
            duration: seconds.map(TimeDelta::seconds),
            is_live: false,
        }
    }

    #[test]
    fn test_select_best_candidate_minimum_distance() {
        let target = TimeDelta::seconds(200);
        let candidates = vec![
            Candidate::new("a", TimeDelta::seconds(205)),
            Candidate::new("b", TimeDelta::seconds(195)),
            Candidate::new("c", TimeDelta::seconds(202)),
        ];
        let best = select_best_candidate(target, candidates).unwrap();
        assert_eq!(best.link(), "c");
    }

    #[test]
    fn test_select_best_candidate_tie_break_is_stable() {
        let target = TimeDelta::seconds(200);
        let candidates = vec![
            Candidate::new("a", TimeDelta::seconds(203)),
            Candidate::new("b", TimeDelta::seconds(197)),
        ];
        let best = select_best_candidate(target, candidates).unwrap();
        assert_eq!(best.link(), "a");
    }

    #[test]
    fn test_select_best_candidate_empty() {
        assert_eq!(select_best_candidate(TimeDelta::seconds(1), vec![]), None);
    }

    #[tokio::test]
    async fn test_resolve_track_closest_duration() {
        let search = FakeSearch::default().with_results(
            "Song Artist audio",
            vec![
                result("https://example.com/150", Some(150)),
                result("https://example.com/205", Some(205)),
                result("https://example.com/400", Some(400)),
            ],
        );
        let resolver = TrackResolver::new(search);
        let mut track = Track::new("Song", "Artist", "Album", TimeDelta::seconds(200));

        let outcome = resolver.resolve_track(&mut track).await;
        let expected = "https://example.com/205";
        assert!(matches!(outcome, ResolveOutcome::Resolved(_)));
        assert_eq!(track.link(), Some(expected));
        assert_eq!(
            resolver.search.queries(),
            vec![("Song Artist audio".to_string(), DEFAULT_RESULT_LIMIT)]
        );
    }

    #[tokio::test]
    async fn test_resolve_track_ignores_unknown_durations_and_live_streams() {
        let mut live = result("https://example.com/live", Some(200));
        live.is_live = true;
        let search = FakeSearch::default().with_results(
            "Song audio",
            vec![
                result("https://example.com/unknown", None),
                live,
                result("https://example.com/300", Some(300)),
            ],
        );
        let resolver = TrackResolver::new(search);
        let mut track = Track::new("Song", "Unknown Artist", "Album", TimeDelta::seconds(200));

        drop(resolver.resolve_track(&mut track).await);
        assert_eq!(track.link(), Some("https://example.com/300"));
    }

    #[tokio::test]
    async fn test_resolve_track_without_scored_candidates() {
        let search = FakeSearch::default().with_results(
            "Song Artist audio",
            vec![result("https://example.com/unknown", None)],
        );
        let resolver = TrackResolver::new(search);
        let mut track = Track::new("Song", "Artist", "Album", TimeDelta::seconds(200));

        let outcome = resolver.resolve_track(&mut track).await;
        assert!(matches!(
            outcome,
            ResolveOutcome::Unresolved(ResolutionError::NoMatch)
        ));
        assert!(!track.is_resolved());
    }

    #[tokio::test]
    async fn test_resolve_track_skips_without_search() {
        let resolver = TrackResolver::new(FakeSearch::default());

        let mut linked = Track::new("Song", "Artist", "Album", TimeDelta::seconds(200))
            .with_link("https://example.com/existing");
        let outcome = resolver.resolve_track(&mut linked).await;
        assert!(matches!(
            outcome,
            ResolveOutcome::Skipped(SkipReason::AlreadyLinked)
        ));
        assert_eq!(linked.link(), Some("https://example.com/existing"));

        let mut no_duration = Track::new("Song", "Artist", "Album", TimeDelta::zero());
        let outcome = resolver.resolve_track(&mut no_duration).await;
        assert!(matches!(
            outcome,
            ResolveOutcome::Skipped(SkipReason::InvalidDuration)
        ));

        let mut untitled = Track::new("", "Artist", "Album", TimeDelta::seconds(200));
        let outcome = resolver.resolve_track(&mut untitled).await;
        assert!(matches!(
            outcome,
            ResolveOutcome::Skipped(SkipReason::MissingTitle)
        ));
        assert!(!untitled.is_resolved());

        assert!(resolver.search.queries().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_all_continues_after_search_failure() {
        let search = FakeSearch::default()
            .with_failure("Broken Artist audio")
            .with_results(
                "Working Artist audio",
                vec![result("https://example.com/working", Some(180))],
            );
        let resolver = TrackResolver::new(search).with_result_limit(3);
        let mut tracks = vec![
            Track::new("Broken", "Artist", "Album", TimeDelta::seconds(180)),
            Track::new("Working", "Artist", "Album", TimeDelta::seconds(180)),
            Track::new("Missing", "Artist", "Album", TimeDelta::seconds(180)),
            Track::new("Zero", "Artist", "Album", TimeDelta::zero()),
            Track::new("Linked", "Artist", "Album", TimeDelta::seconds(1))
                .with_link("https://example.com/linked"),
        ];

        let summary = resolver.resolve_all(&mut tracks).await;
        assert_eq!(
            summary,
            ResolveSummary {
                resolved: 1,
                already_linked: 1,
                skipped: 1,
                unresolved: 2,
            }
        );
        assert!(!tracks[0].is_resolved());
        assert_eq!(tracks[1].link(), Some("https://example.com/working"));
        assert_eq!(tracks[4].link(), Some("https://example.com/linked"));
        let queries = resolver.search.queries();
        let limits: Vec<usize> = queries.iter().map(|(_, limit)| *limit).collect();
        assert_eq!(limits, vec![3, 3, 3]);
    }
}
