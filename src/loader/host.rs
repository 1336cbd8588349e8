// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{LoadError, LoadResult};
use crate::traits::{ArtifactResolver, HostArtifacts, Runnable};
use std::path::Path;
use std::sync::Arc;

/// Entry points the embedding host registered natively. They are trusted and
/// always win over an isolated artifact with the same name.
#[derive(Debug, Clone, Default)]
pub struct HostResolver {
    artifacts: HostArtifacts,
}

impl HostResolver {
    pub fn new(artifacts: HostArtifacts) -> Self {
        Self { artifacts }
    }
}

impl ArtifactResolver for HostResolver {
    fn resolve_by_name(&self, name: &str) -> Option<Arc<dyn Runnable>> {
        self.artifacts.get(name).cloned()
    }

    fn materialize_from_bytes(
        &self,
        name: &str,
        _bytes: &[u8],
        _path: &Path,
    ) -> LoadResult<Arc<dyn Runnable>> {
        Err(LoadError::not_found(
            name,
            "the host runtime only provides registered entry points",
        ))
    }
}
