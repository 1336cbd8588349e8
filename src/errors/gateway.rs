// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{LoadError, ToolchainError};
use std::sync::Arc;
use thiserror::Error;

/// Failures surfaced by the execution gateway.
///
/// Compile diagnostics are not errors: they travel in the normal result
/// channel. This type covers the structural failures that end up in the
/// error mailbox. It is `Clone` so the same failure can be both recorded in
/// the mailbox and returned to a native caller.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// The caller's origin is not trusted; nothing was done.
    #[error("security violation: {0}")]
    Security(String),

    /// The compiler could not be invoked.
    #[error("compiler unavailable: {0}")]
    Toolchain(#[source] Arc<ToolchainError>),

    /// The artifact could not be loaded.
    #[error("load failure: {0}")]
    Load(#[source] Arc<LoadError>),

    /// The artifact's own code failed while running.
    #[error("runtime failure in '{artifact}': {message}")]
    Runtime { artifact: String, message: String },

    /// Filesystem trouble around a request (temp dirs, source files).
    #[error("I/O error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    /// A background worker could not be started.
    #[error("worker failure: {0}")]
    Worker(String),
}

impl GatewayError {
    /// Stable, flat name of the failure class for boundary records.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Security(_) => "security",
            GatewayError::Toolchain(_) => "toolchain",
            GatewayError::Load(_) => "load",
            GatewayError::Runtime { .. } => "runtime",
            GatewayError::Io(_) => "io",
            GatewayError::Worker(_) => "worker",
        }
    }
}

impl From<ToolchainError> for GatewayError {
    fn from(error: ToolchainError) -> Self {
        GatewayError::Toolchain(Arc::new(error))
    }
}

impl From<LoadError> for GatewayError {
    fn from(error: LoadError) -> Self {
        GatewayError::Load(Arc::new(error))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(error: std::io::Error) -> Self {
        GatewayError::Io(Arc::new(error))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
