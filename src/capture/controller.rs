// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::console::{Console, LayerId, OutputSink};
use crate::observability::messages::capture::{CaptureStarted, CaptureStopped};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives console text while a capture session is active.
pub trait OutputListener: Send + Sync {
    fn print(&self, text: &str);
}

impl<F> OutputListener for F
where
    F: Fn(&str) + Send + Sync,
{
    fn print(&self, text: &str) {
        self(text)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between a controller and the layer it pushed.
#[derive(Default)]
struct Accumulator {
    text: Mutex<String>,
    listeners: Mutex<Vec<Arc<dyn OutputListener>>>,
}

/// The sink a session installs: records, then notifies listeners.
struct Multiplexer(Arc<Accumulator>);

impl OutputSink for Multiplexer {
    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        lock(&self.0.text).push_str(&text);
        let listeners = lock(&self.0.listeners).clone();
        for listener in listeners {
            listener.print(&text);
        }
        Ok(())
    }
}

/// Capture controller for one console.
///
/// `start_listening` pushes a capture layer, `stop_listening` removes it.
/// Starting again while active first removes the old layer, so toggling never
/// stacks layers from the same controller. The accumulated text survives
/// `stop_listening` and is cleared by the next `start_listening`.
pub struct OutputCapture {
    console: Arc<Console>,
    accumulator: Arc<Accumulator>,
    layer: Mutex<Option<LayerId>>,
}

impl OutputCapture {
    /// Capture on the process-wide console.
    pub fn new() -> Self {
        Self::attached_to(Console::global())
    }

    pub fn attached_to(console: Arc<Console>) -> Self {
        Self {
            console,
            accumulator: Arc::new(Accumulator::default()),
            layer: Mutex::new(None),
        }
    }

    /// Register a listener without starting a session. Registering the same
    /// listener twice has no further effect.
    pub fn add_listener(&self, listener: Arc<dyn OutputListener>) {
        let mut listeners = lock(&self.accumulator.listeners);
        let already = listeners
            .iter()
            .any(|known| std::ptr::addr_eq(Arc::as_ptr(known), Arc::as_ptr(&listener)));
        if !already {
            listeners.push(listener);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.accumulator.listeners).len()
    }

    /// Begin capturing, optionally registering one more listener first.
    pub fn start_listening(&self, listener: Option<Arc<dyn OutputListener>>) {
        if let Some(listener) = listener {
            self.add_listener(listener);
        }
        let mut layer = lock(&self.layer);
        if let Some(previous) = layer.take() {
            self.console.remove_layer(previous);
        }
        lock(&self.accumulator.text).clear();
        let sink = Arc::new(Multiplexer(Arc::clone(&self.accumulator)));
        let (id, depth) = self.console.push_layer(sink);
        tracing::debug!(
            "{}",
            CaptureStarted {
                layer_id: id.value(),
                depth
            }
        );
        *layer = Some(id);
    }

    /// Stop capturing. Calling it when not listening does nothing.
    pub fn stop_listening(&self) {
        let Some(id) = lock(&self.layer).take() else {
            return;
        };
        if let Some(depth) = self.console.remove_layer(id) {
            tracing::debug!(
                "{}",
                CaptureStopped {
                    layer_id: id.value(),
                    depth,
                    captured_bytes: lock(&self.accumulator.text).len(),
                }
            );
        }
    }

    pub fn is_listening(&self) -> bool {
        lock(&self.layer).is_some()
    }

    /// Everything captured since the last `start_listening`.
    pub fn result(&self) -> String {
        lock(&self.accumulator.text).clone()
    }

    /// Start a session that ends when the guard is dropped, on every exit path.
    pub fn scoped(&self) -> CaptureGuard<'_> {
        self.start_listening(None);
        CaptureGuard { capture: self }
    }
}

impl Default for OutputCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OutputCapture {
    fn drop(&mut self) {
        self.stop_listening();
    }
}

/// Ends a scoped capture session on drop.
pub struct CaptureGuard<'a> {
    capture: &'a OutputCapture,
}

impl CaptureGuard<'_> {
    pub fn result(&self) -> String {
        self.capture.result()
    }
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.capture.stop_listening();
    }
}
