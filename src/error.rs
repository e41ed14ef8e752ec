// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Error and result types.

use std::io;
use thiserror::Error;

/// Main error type.
#[derive(Error, Debug)]
pub enum ErrorType {
    /// Configuration error.
    #[error("Configuration Error ({0})")]
    Config(#[from] crate::config::ConfigError),
    /// The configuration could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialization(#[from] toml::ser::Error),
    /// I/O Error.
    #[error("Input/Output error ({:?})", .0)]
    Io(#[from] io::Error),
    /// The track store could not be read or written.
    #[error("{0}")]
    Persistence(#[from] crate::store::PersistenceError),
    /// The logger could not be initialized.
    #[error("Failed to initialize logging: {0}")]
    Logger(#[from] log::SetLoggerError),
    /// An error from the user interface.
    #[error("Error encountered while showing UI: {0}")]
    InquireError(#[from] inquire::InquireError),
}

/// Convenience type.
pub type Result<T> = std::result::Result<T, ErrorType>;
