// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Filesystem-related utility functions.

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::Path;

/// Characters that are stripped from file names (in addition to control characters).
const ILLEGAL_FILENAME_CHARS: &str = r#"\/*?:"<>|"#;

/// Strips control characters and characters that are illegal in file names on common platforms.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control())
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(*c))
        .collect()
}

/// Write a file atomically.
///
/// The content is first written to a temporary file in the destination directory, which is then
/// renamed to the destination path. Concurrent readers either see the old or the new content,
/// never a partially written file.
pub fn write_atomically<P, F>(destination: P, write_fn: F) -> io::Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let destination = destination.as_ref();
    let dest_filename = destination
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or(io::Error::other("cannot determine destination file name"))?;
    let dest_dir = destination
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dest_dir)?;

    let mut temp_destination_file = tempfile::Builder::new()
        .prefix(format!(".tunefetch.{dest_filename}").as_str())
        .suffix(".tmp")
        .tempfile_in(dest_dir)?;
    write_fn(temp_destination_file.as_file_mut())?;
    temp_destination_file.as_file().sync_all()?;

    // When writing succeeded, persist the temporary file at the actual destination.
    let temp_destination = temp_destination_file.into_temp_path();
    temp_destination.persist(destination)?;
    log::debug!("Wrote file {}", destination.display());

    Ok(())
}
