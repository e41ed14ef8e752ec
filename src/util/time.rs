// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Time-related utility functions.

use chrono::TimeDelta;
use std::num::ParseIntError;
use thiserror::Error;

/// Indicates that a value can be represent a duration as a formatted string.
pub trait FormattedDuration {
    /// Format the duration as a string, either in the form `M:SS` or `H:MM:SS`.
    fn formatted_duration(&self) -> String;
}

impl FormattedDuration for TimeDelta {
    fn formatted_duration(&self) -> String {
        let hours = self.num_hours();
        let minutes = self.num_minutes() - hours * 60;
        let seconds = self.num_seconds() - hours * 60 * 60 - minutes * 60;
        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }
}

/// Reason why a clock string could not be parsed into a duration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    /// The string was empty.
    #[error("empty duration")]
    Empty,
    /// The string does not have the form `M:SS` or `H:MM:SS`.
    #[error("expected M:SS or H:MM:SS, got {0:?}")]
    InvalidFormat(String),
    /// One of the components is not a non-negative integer.
    #[error("invalid number in duration ({0})")]
    InvalidNumber(#[from] ParseIntError),
}

/// Parse a colon-delimited clock string (`M:SS` or `H:MM:SS`) into a [`TimeDelta`].
///
/// # Errors
///
/// Returns an error if the string is empty, has the wrong number of components or if any
/// component is not a non-negative integer.
pub fn parse_duration(value: &str) -> Result<TimeDelta, DurationParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let parts = value
        .split(':')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<u32>, ParseIntError>>()?;
    let seconds = match parts.as_slice() {
        [minutes, seconds] => i64::from(*minutes) * 60 + i64::from(*seconds),
        [hours, minutes, seconds] => {
            i64::from(*hours) * 60 * 60 + i64::from(*minutes) * 60 + i64::from(*seconds)
        }
        _ => return Err(DurationParseError::InvalidFormat(value.to_string())),
    };

    Ok(TimeDelta::seconds(seconds))
}

/// Convert a floating point number of seconds (as reported by media sites) into a [`TimeDelta`]
/// with millisecond precision.
///
/// Returns `None` for negative or non-finite values.
#[expect(clippy::cast_possible_truncation)]
pub fn duration_from_secs_f64(seconds: f64) -> Option<TimeDelta> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    TimeDelta::try_milliseconds((seconds * 1000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paste::paste;

    macro_rules! add_test_parse_duration {
        ($input:expr, $expected_seconds:expr, $fnsuffix:ident) => {
            paste! {
                #[test]
                fn [<test_parse_duration_ $fnsuffix>]() {
                    assert_eq!(
                        parse_duration($input),
                        Ok(TimeDelta::seconds($expected_seconds))
                    );
                }
            }
        };
    }

    add_test_parse_duration!("3:46", 226, minutes_seconds);
    add_test_parse_duration!("03:46", 226, padded_minutes);
    add_test_parse_duration!("1:03:46", 3826, hours_minutes_seconds);
    add_test_parse_duration!("0:00", 0, zero);
    add_test_parse_duration!(" 4:20 ", 260, surrounding_whitespace);

    #[test]
    fn test_parse_duration_empty() {
        assert_eq!(parse_duration(""), Err(DurationParseError::Empty));
        assert_eq!(parse_duration("   "), Err(DurationParseError::Empty));
    }

    #[test]
    fn test_parse_duration_invalid_format() {
        assert!(matches!(
            parse_duration("226"),
            Err(DurationParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_duration("1:2:3:4"),
            Err(DurationParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_duration_invalid_number() {
        assert!(matches!(
            parse_duration("Unknown Duration"),
            Err(DurationParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_duration("3:-1"),
            Err(DurationParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_formatted_duration() {
        assert_eq!(TimeDelta::seconds(226).formatted_duration(), "3:46");
        assert_eq!(TimeDelta::seconds(3826).formatted_duration(), "1:03:46");
        assert_eq!(TimeDelta::seconds(5).formatted_duration(), "0:05");
    }

    #[test]
    fn test_duration_from_secs_f64() {
        assert_eq!(duration_from_secs_f64(205.0), Some(TimeDelta::seconds(205)));
        assert_eq!(
            duration_from_secs_f64(1.5),
            Some(TimeDelta::milliseconds(1500))
        );
        assert_eq!(duration_from_secs_f64(-1.0), None);
        assert_eq!(duration_from_secs_f64(f64::NAN), None);
    }
}
