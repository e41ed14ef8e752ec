// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Utility functions

mod fs;
#[cfg(test)]
mod testing;
mod time;

pub use fs::{sanitize_filename, write_atomically};
#[cfg(test)]
pub use testing::{FakeFetcher, FakeSearch};
pub use time::{duration_from_secs_f64, parse_duration, DurationParseError, FormattedDuration};
