// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::capture::{OutputSink, SinkWriter};
use crate::errors::RunError;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

/// The single entry-point contract every loaded artifact satisfies.
///
/// Whether an artifact can be turned into a `Runnable` is decided once, when
/// it is loaded. After that, running it is a plain method call.
///
/// Output goes to `console` as it is produced; the caller wires it to the
/// per-request buffer and the process-wide console. Implementations must not
/// write to the process's stdout directly.
pub trait Runnable: Send + Sync {
    fn run(&self, console: Arc<dyn OutputSink>) -> Result<(), RunError>;

    /// Where the entry point came from, for logs and error messages.
    fn origin(&self) -> &str;
}

/// Adapter so plain closures can be registered as trusted host entry points.
pub struct HostFn<F> {
    name: String,
    body: F,
}

impl<F> HostFn<F>
where
    F: Fn(&mut dyn Write) -> Result<(), RunError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, body: F) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

impl<F> Runnable for HostFn<F>
where
    F: Fn(&mut dyn Write) -> Result<(), RunError> + Send + Sync,
{
    fn run(&self, console: Arc<dyn OutputSink>) -> Result<(), RunError> {
        let mut out = SinkWriter::new(console);
        (self.body)(&mut out)
    }

    fn origin(&self) -> &str {
        &self.name
    }
}

/// Newtype wrapper for the host's own, trusted entry points keyed by name.
#[derive(Clone, Default)]
pub struct HostArtifacts(pub HashMap<String, Arc<dyn Runnable>>);

impl HostArtifacts {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, runnable: Arc<dyn Runnable>) {
        self.0.insert(name.into(), runnable);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Runnable>> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for HostArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostArtifacts")
            .field("artifact_count", &self.0.len())
            .field("artifact_names", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}
