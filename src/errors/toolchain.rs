// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// The compiler itself could not do its job.
///
/// These are structural failures, distinct from a diagnostic transcript: the
/// learner's code was never judged.
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// The compiler binary could not be spawned (missing or misconfigured).
    #[error("compiler '{program}' is unavailable: {source}")]
    Unavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiler died without an exit code and without diagnostics.
    #[error("compiler crashed: {0}")]
    Crashed(String),

    /// The compiler reported success but the artifact is not on disk.
    #[error("compiler reported success but produced no artifact at {}", .0.display())]
    MissingArtifact(PathBuf),
}

pub type ToolchainResult<T> = Result<T, ToolchainError>;
