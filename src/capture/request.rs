// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::console::{Console, OutputSink};
use crate::observability::messages::capture::SinkWriteFailed;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Per-request console sink.
///
/// Bytes are kept in the request's own buffer and forwarded to the console,
/// so a request's result holds exactly its own output even when other
/// requests print at the same time, while capture sessions and the base sink
/// still see everything.
///
/// Shared as an `Arc` with whatever produces the output, so each write is
/// forwarded as it happens. A failing console is logged and never fails the
/// request: the buffer is the request's result.
pub struct RequestConsole {
    console: Arc<Console>,
    buffer: Mutex<Vec<u8>>,
}

impl RequestConsole {
    pub fn new(console: Arc<Console>) -> Self {
        Self {
            console,
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// What this request has printed so far.
    pub fn text(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl OutputSink for RequestConsole {
    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        if let Err(error) = self.console.write(bytes) {
            tracing::warn!("{}", SinkWriteFailed { error: &error });
        }
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        if let Err(error) = self.console.flush() {
            tracing::warn!("{}", SinkWriteFailed { error: &error });
        }
        Ok(())
    }
}

impl Write for RequestConsole {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.write_bytes(bytes)?;
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        OutputSink::flush(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::console::tests::{FailingSink, RecordingSink};
    use crate::capture::OutputCapture;

    #[test]
    fn test_request_buffer_and_console_both_receive() {
        let base = Arc::new(RecordingSink::default());
        let console = Arc::new(Console::new(base.clone()));
        let session = OutputCapture::attached_to(console.clone());
        session.start_listening(None);

        let mut first = RequestConsole::new(console.clone());
        let mut second = RequestConsole::new(console.clone());
        write!(first, "from first").unwrap();
        write!(second, "from second").unwrap();

        assert_eq!(first.text(), "from first");
        assert_eq!(second.text(), "from second");
        assert_eq!(session.result(), "from firstfrom second");
        assert_eq!(base.text(), "from firstfrom second");
    }

    #[test]
    fn test_broken_console_keeps_the_request_output() {
        let console = Arc::new(Console::new(Arc::new(FailingSink)));
        let out = RequestConsole::new(console);
        assert!(out.write_bytes(b"still here\n").is_ok());
        assert!(OutputSink::flush(&out).is_ok());
        assert_eq!(out.text(), "still here\n");
    }
}
