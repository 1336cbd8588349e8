// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::LoadResult;
use crate::traits::Runnable;
use std::path::Path;
use std::sync::Arc;

/// A source of runnable artifacts.
///
/// The loader composes resolvers by priority: a trusted resolver answers by
/// name first, and only when it declines are bytes read from disk and handed
/// to an isolating resolver.
pub trait ArtifactResolver: Send + Sync {
    /// Return an already-available entry point for `name`, if this resolver owns one.
    fn resolve_by_name(&self, name: &str) -> Option<Arc<dyn Runnable>>;

    /// Turn an artifact's bytes into an entry point.
    ///
    /// `path` is only used for error messages and logs.
    fn materialize_from_bytes(
        &self,
        name: &str,
        bytes: &[u8],
        path: &Path,
    ) -> LoadResult<Arc<dyn Runnable>>;
}
