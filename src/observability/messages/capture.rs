// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for console capture layers.

use std::fmt::{Display, Formatter};

/// A capture layer was pushed onto the console.
pub struct CaptureStarted {
    pub layer_id: u64,
    pub depth: usize,
}

impl Display for CaptureStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Console capture layer {} started (active layers: {})",
            self.layer_id, self.depth
        )
    }
}

/// A capture layer was removed from the console.
pub struct CaptureStopped {
    pub layer_id: u64,
    pub depth: usize,
    pub captured_bytes: usize,
}

impl Display for CaptureStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Console capture layer {} stopped after {} bytes (active layers: {})",
            self.layer_id, self.captured_bytes, self.depth
        )
    }
}

/// A sink in the console chain rejected a write.
///
/// # Log Level
/// `warn!` - the remaining sinks still receive the bytes
pub struct SinkWriteFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for SinkWriteFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Console sink write failed: {}", self.error)
    }
}
