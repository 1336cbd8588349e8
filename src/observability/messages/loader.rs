// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for artifact loading.

use std::fmt::{Display, Formatter};

/// Artifact served from the loader's private cache.
///
/// # Log Level
/// `debug!` - Routine
pub struct ArtifactCacheHit<'a> {
    pub name: &'a str,
}

impl Display for ArtifactCacheHit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Artifact '{}' served from loader cache", self.name)
    }
}

/// A trusted host entry point answered for the name; no bytes were read.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_scriptgate::observability::messages::loader::HostArtifactResolved;
///
/// let msg = HostArtifactResolved { name: "hello" };
/// assert_eq!(msg.to_string(), "Artifact 'hello' resolved by the host runtime");
/// ```
pub struct HostArtifactResolved<'a> {
    pub name: &'a str,
}

impl Display for HostArtifactResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Artifact '{}' resolved by the host runtime", self.name)
    }
}

/// Artifact bytes were read, validated and materialized into the isolated space.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ArtifactMaterialized<'a> {
    pub name: &'a str,
    pub path: &'a str,
    pub size_bytes: usize,
}

impl Display for ArtifactMaterialized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Materialized artifact '{}' from {} ({} bytes)",
            self.name, self.path, self.size_bytes
        )
    }
}

/// Loading failed; nothing was cached for the name.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ArtifactLoadFailed<'a> {
    pub path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ArtifactLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to load artifact '{}': {}", self.path, self.error)
    }
}
