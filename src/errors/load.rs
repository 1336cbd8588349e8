// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failures while turning an artifact path into a runnable entry point.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The path does not name an artifact (no file stem, not UTF-8, ...).
    #[error("invalid artifact path '{0}'")]
    InvalidPath(String),

    /// Reading, parsing or linking the artifact failed. Nothing was cached.
    #[error("class not found: artifact '{name}' could not be loaded: {cause}")]
    NotFound { name: String, cause: String },

    /// The artifact loaded but does not satisfy the `run` entry contract.
    #[error("artifact at '{path}' is not runnable: {reason}")]
    NotRunnable { path: String, reason: String },
}

impl LoadError {
    pub fn not_found(name: &str, cause: impl std::fmt::Display) -> Self {
        LoadError::NotFound {
            name: name.to_string(),
            cause: cause.to_string(),
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
