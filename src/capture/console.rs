// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::observability::messages::capture::SinkWriteFailed;
use std::io::{self, Write};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

/// Anything the console can deliver bytes to.
pub trait OutputSink: Send + Sync {
    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()>;

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// The process's real standard output.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()
    }
}

/// The process's real standard error. Hosts that use stdout as a protocol
/// channel install this as the base sink.
pub struct StderrSink;

impl OutputSink for StderrSink {
    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        stderr.write_all(bytes)?;
        stderr.flush()
    }
}

/// `io::Write` over a shared sink, for code that wants a writer.
pub struct SinkWriter(Arc<dyn OutputSink>);

impl SinkWriter {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self(sink)
    }
}

impl Write for SinkWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.write_bytes(bytes)?;
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// Identifies one capture layer on one console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(u64);

impl LayerId {
    pub fn value(self) -> u64 {
        self.0
    }
}

struct ConsoleState {
    base: Arc<dyn OutputSink>,
    layers: Vec<(LayerId, Arc<dyn OutputSink>)>,
    next_id: u64,
}

/// A console: one base sink plus an ordered stack of capture layers.
///
/// The lock only guards the layer list. Writes take a snapshot of the chain
/// and deliver outside the lock, so a slow sink never blocks sessions from
/// starting or stopping.
pub struct Console {
    state: Mutex<ConsoleState>,
}

static GLOBAL_CONSOLE: LazyLock<Arc<Console>> =
    LazyLock::new(|| Arc::new(Console::new(Arc::new(StdoutSink))));

impl Console {
    pub fn new(base: Arc<dyn OutputSink>) -> Self {
        Self {
            state: Mutex::new(ConsoleState {
                base,
                layers: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// The process-wide console.
    pub fn global() -> Arc<Console> {
        Arc::clone(&GLOBAL_CONSOLE)
    }

    fn lock(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `bytes` to every active layer, newest first, then to the base sink.
    ///
    /// A failing layer does not stop delivery to the rest of the chain; the
    /// base sink's error, if any, is the one returned.
    pub fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let (layers, base) = {
            let state = self.lock();
            let layers: Vec<Arc<dyn OutputSink>> =
                state.layers.iter().rev().map(|(_, sink)| Arc::clone(sink)).collect();
            (layers, Arc::clone(&state.base))
        };
        for layer in layers {
            if let Err(error) = layer.write_bytes(bytes) {
                tracing::warn!("{}", SinkWriteFailed { error: &error });
            }
        }
        base.write_bytes(bytes)
    }

    pub fn print(&self, text: &str) -> io::Result<()> {
        self.write(text.as_bytes())
    }

    pub fn flush(&self) -> io::Result<()> {
        let base = Arc::clone(&self.lock().base);
        base.flush()
    }

    /// Replace the base sink, returning the previous one.
    ///
    /// Active layers are untouched and keep forwarding to whichever base is
    /// current at write time.
    pub fn install_base(&self, sink: Arc<dyn OutputSink>) -> Arc<dyn OutputSink> {
        std::mem::replace(&mut self.lock().base, sink)
    }

    /// Number of capture layers currently active.
    pub fn depth(&self) -> usize {
        self.lock().layers.len()
    }

    pub(super) fn push_layer(&self, sink: Arc<dyn OutputSink>) -> (LayerId, usize) {
        let mut state = self.lock();
        let id = LayerId(state.next_id);
        state.next_id += 1;
        state.layers.push((id, sink));
        (id, state.layers.len())
    }

    /// Remove a layer wherever it sits in the stack.
    ///
    /// Returns the remaining depth, or `None` if the layer was already gone.
    pub(super) fn remove_layer(&self, id: LayerId) -> Option<usize> {
        let mut state = self.lock();
        let index = state.layers.iter().position(|(layer, _)| *layer == id)?;
        state.layers.remove(index);
        Some(state.layers.len())
    }
}
