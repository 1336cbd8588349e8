// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Console output capture.
//!
//! The process has one console: a base sink (the "original" output, stdout
//! unless the host swaps it) and a stack of capture layers above it. Every
//! write fans out through all active layers and always reaches the base sink.
//!
//! ```text
//! write ──▶ layer N ──▶ ... ──▶ layer 1 ──▶ base sink
//!            │                   │
//!            ▼                   ▼
//!       accumulator +        accumulator +
//!        listeners            listeners
//! ```
//!
//! Layers are only added and removed through [`OutputCapture`], so a stopped
//! session always leaves the chain exactly as it would be without it.

pub(crate) mod console;
mod controller;
mod request;

pub use console::{Console, LayerId, OutputSink, SinkWriter, StderrSink, StdoutSink};
pub use controller::{CaptureGuard, OutputCapture, OutputListener};
pub use request::RequestConsole;
