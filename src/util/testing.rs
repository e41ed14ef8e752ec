// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

#![cfg(test)]
//! Testing utils.

use crate::fetch::{FetchError, FetchRequest, MediaFetcher};
use crate::search::{SearchError, SearchProvider, SearchResult};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A fake search provider with canned results.
#[derive(Debug, Default)]
pub struct FakeSearch {
    /// Results per query.
    results: HashMap<String, Vec<SearchResult>>,
    /// Queries that fail.
    failing: HashSet<String>,
    /// All received queries and their limits.
    queries: Mutex<Vec<(String, usize)>>,
}

impl FakeSearch {
    /// Return the given results for the query.
    pub fn with_results(mut self, query: &str, results: Vec<SearchResult>) -> Self {
        drop(self.results.insert(query.to_string(), results));
        self
    }

    /// Make searching for the query fail.
    pub fn with_failure(mut self, query: &str) -> Self {
        let _ = self.failing.insert(query.to_string());
        self
    }

    /// All queries received so far.
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), limit));

        if self.failing.contains(query) {
            return Err(SearchError::Spawn {
                program: PathBuf::from("fake-search"),
                source: io::Error::other("simulated search failure"),
            });
        }

        Ok(self
            .results
            .get(query)
            .map(|results| results.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

/// A fake media fetcher that writes a small placeholder file.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    /// URLs whose download fails.
    failing: HashSet<String>,
    /// URLs whose download panics.
    panicking: HashSet<String>,
    /// Simulated download time.
    delay: Option<Duration>,
    /// All fetched URLs.
    calls: Mutex<Vec<String>>,
    /// Number of currently running downloads.
    in_flight: AtomicUsize,
    /// Maximum number of simultaneously running downloads.
    max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    /// Make fetching the URL fail.
    pub fn with_failure(mut self, url: &str) -> Self {
        let _ = self.failing.insert(url.to_string());
        self
    }

    /// Make fetching the URL panic.
    pub fn with_panic(mut self, url: &str) -> Self {
        let _ = self.panicking.insert(url.to_string());
        self
    }

    /// Simulate a download time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All URLs fetched so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Maximum number of downloads that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl MediaFetcher for FakeFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<(), FetchError> {
        self.calls.lock().unwrap().push(request.url.clone());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let _ = self.in_flight.fetch_sub(1, Ordering::SeqCst);

        assert!(
            !self.panicking.contains(&request.url),
            "simulated fetch panic"
        );
        if self.failing.contains(&request.url) {
            return Err(FetchError::Io(io::Error::other("simulated fetch failure")));
        }

        tokio::fs::write(request.output_path(), b"ID3").await?;
        Ok(())
    }
}
