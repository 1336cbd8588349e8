// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{ARTIFACT_EXTENSION, MAX_ARTIFACT_SIZE};
use crate::errors::{LoadError, LoadResult};
use crate::observability::messages::loader::{
    ArtifactCacheHit, ArtifactLoadFailed, ArtifactMaterialized, HostArtifactResolved,
};
use crate::traits::{ArtifactResolver, Runnable};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One cache entry. Holding its lock means "this name is being materialized".
type Slot = Arc<Mutex<Option<Arc<dyn Runnable>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Loads artifacts by path, resolving names in priority order:
/// this loader's cache, then the host resolver, then isolated materialization
/// of `<dir>/<name>.wasm`.
///
/// Entries are never evicted. A failed materialization leaves no entry.
/// Concurrent loads of the same name materialize it once; later callers wait
/// for the first and share its handle. Loads of different names only contend
/// on the brief map lookup.
pub struct IsolatedLoader {
    host: Arc<dyn ArtifactResolver>,
    isolated: Arc<dyn ArtifactResolver>,
    max_artifact_bytes: usize,
    cache: Mutex<HashMap<String, Slot>>,
}

impl IsolatedLoader {
    pub fn new(host: Arc<dyn ArtifactResolver>, isolated: Arc<dyn ArtifactResolver>) -> Self {
        Self {
            host,
            isolated,
            max_artifact_bytes: MAX_ARTIFACT_SIZE,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_max_artifact_bytes(mut self, limit: usize) -> Self {
        self.max_artifact_bytes = limit;
        self
    }

    /// Artifact name for a path: its file stem.
    pub fn artifact_name(artifact_path: &Path) -> LoadResult<String> {
        artifact_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| LoadError::InvalidPath(artifact_path.display().to_string()))
    }

    pub fn load(&self, artifact_path: &Path) -> LoadResult<Arc<dyn Runnable>> {
        let name = Self::artifact_name(artifact_path)?;

        if let Some(runnable) = self.cached(&name) {
            tracing::debug!("{}", ArtifactCacheHit { name: &name });
            return Ok(runnable);
        }

        if let Some(runnable) = self.host.resolve_by_name(&name) {
            tracing::debug!("{}", HostArtifactResolved { name: &name });
            return Ok(runnable);
        }

        let slot = Arc::clone(lock(&self.cache).entry(name.clone()).or_default());
        let mut entry = lock(&slot);
        if let Some(runnable) = entry.as_ref() {
            tracing::debug!("{}", ArtifactCacheHit { name: &name });
            return Ok(Arc::clone(runnable));
        }

        let location = Self::payload_path(artifact_path, &name);
        match self.materialize(&name, &location) {
            Ok(runnable) => {
                *entry = Some(Arc::clone(&runnable));
                // A slot orphaned by an earlier failure is put back.
                lock(&self.cache)
                    .entry(name)
                    .or_insert_with(|| Arc::clone(&slot));
                Ok(runnable)
            }
            Err(error) => {
                let path = location.display().to_string();
                tracing::warn!("{}", ArtifactLoadFailed { path: &path, error: &error });
                let mut cache = lock(&self.cache);
                if cache.get(&name).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                    cache.remove(&name);
                }
                Err(error)
            }
        }
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cached(name).is_some()
    }

    pub fn cached_count(&self) -> usize {
        let slots: Vec<Slot> = lock(&self.cache).values().cloned().collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    fn cached(&self, name: &str) -> Option<Arc<dyn Runnable>> {
        let slot = lock(&self.cache).get(name).cloned()?;
        let entry = lock(&slot);
        entry.clone()
    }

    fn payload_path(artifact_path: &Path, name: &str) -> PathBuf {
        let dir = artifact_path.parent().unwrap_or_else(|| Path::new(""));
        dir.join(format!("{}.{}", name, ARTIFACT_EXTENSION))
    }

    fn materialize(&self, name: &str, location: &Path) -> LoadResult<Arc<dyn Runnable>> {
        let size = fs::metadata(location)
            .map_err(|e| LoadError::not_found(name, e))?
            .len();
        if size > self.max_artifact_bytes as u64 {
            return Err(LoadError::not_found(
                name,
                format!(
                    "artifact is {} bytes, the limit is {} bytes",
                    size, self.max_artifact_bytes
                ),
            ));
        }
        let bytes = fs::read(location).map_err(|e| LoadError::not_found(name, e))?;
        let runnable = self.isolated.materialize_from_bytes(name, &bytes, location)?;
        let path = location.display().to_string();
        tracing::info!(
            "{}",
            ArtifactMaterialized {
                name,
                path: &path,
                size_bytes: bytes.len(),
            }
        );
        Ok(runnable)
    }
}
