// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the hub core.
//!
//! The hot path (`set_value`, `value`, listener fan-out) never fails. Errors
//! only surface while the hub is being wired together: registering items,
//! building timers, and serializing snapshots for the presentation layer.
//! A bootstrap is expected to abort on any of them rather than run with a
//! partial configuration.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while registering an item.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A timer was built outside of a tokio runtime.
    #[error("timer requires a tokio runtime")]
    NoRuntime,

    /// Serializing an item snapshot failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to the item registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Another item is already registered under this key.
    #[error("duplicate item key: {0}")]
    DuplicateKey(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
